pub mod interaction_desc;

pub use interaction_desc::{ArInteractionDesc, ScatterOrigin};
