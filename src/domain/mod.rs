// Domain layer: response models, the resolved-value variant and the ports (traits)
// the engine talks to. No I/O here.

pub mod model;
pub mod ports;
pub mod value;
