pub mod sample;

pub use sample::{Channel, ChannelValues, Sample, SampleSeries};
