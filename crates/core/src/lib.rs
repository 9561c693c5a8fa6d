//! Face-pair similarity classification: per-image twins/siblings/similar
//! labelling, batch orchestration with progress events, and disk-backed
//! batch storage with a retention window.

pub mod classification;
pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod shared;
pub mod storage;
