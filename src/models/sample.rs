//! Emotion sample data model.
//!
//! A sample is one reading of the seven emotion channels captured at a point
//! in time. Series are produced in timestamp order by the sample store and are
//! never re-sorted downstream.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Channel {
    /// Canonical channel order used for columns, datasets and storage.
    pub const ALL: [Channel; 7] = [
        Channel::Neutral,
        Channel::Happy,
        Channel::Sad,
        Channel::Angry,
        Channel::Fearful,
        Channel::Disgusted,
        Channel::Surprised,
    ];

    pub fn index(self) -> usize {
        match self {
            Channel::Neutral => 0,
            Channel::Happy => 1,
            Channel::Sad => 2,
            Channel::Angry => 3,
            Channel::Fearful => 4,
            Channel::Disgusted => 5,
            Channel::Surprised => 6,
        }
    }

    /// Display label used for sheet headers and chart datasets.
    pub fn label(self) -> &'static str {
        match self {
            Channel::Neutral => "Neutral",
            Channel::Happy => "Happy",
            Channel::Sad => "Sad",
            Channel::Angry => "Angry",
            Channel::Fearful => "Fearful",
            Channel::Disgusted => "Disgusted",
            Channel::Surprised => "Surprised",
        }
    }

    /// Column name in the `expressions` table.
    pub fn column(self) -> &'static str {
        match self {
            Channel::Neutral => "neutral",
            Channel::Happy => "happy",
            Channel::Sad => "sad",
            Channel::Angry => "angry",
            Channel::Fearful => "fearful",
            Channel::Disgusted => "disgusted",
            Channel::Surprised => "surprised",
        }
    }
}

/// Intensity per channel, indexed in [`Channel::ALL`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelValues([f64; 7]);

impl ChannelValues {
    pub fn new(values: [f64; 7]) -> Self {
        Self(values)
    }

    pub fn get(&self, channel: Channel) -> f64 {
        self.0[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, value: f64) {
        self.0[channel.index()] = value;
    }

    pub fn as_array(&self) -> &[f64; 7] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.iter().map(move |&channel| (channel, self.get(channel)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub channels: ChannelValues,
}

impl Sample {
    pub fn new(timestamp: i64, channels: [f64; 7]) -> Self {
        Self {
            timestamp,
            channels: ChannelValues::new(channels),
        }
    }
}

/// Timestamp-ordered samples as handed over by the producer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries(Vec<Sample>);

impl SampleSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self(samples)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Sample>> for SampleSeries {
    fn from(samples: Vec<Sample>) -> Self {
        Self(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_order_matches_indices() {
        for (position, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), position);
        }
    }

    #[test]
    fn channel_values_get_and_set() {
        let mut values = ChannelValues::default();
        values.set(Channel::Fearful, 0.75);
        assert_eq!(values.get(Channel::Fearful), 0.75);
        assert_eq!(values.get(Channel::Happy), 0.0);

        let collected: Vec<Channel> = values.iter().map(|(channel, _)| channel).collect();
        assert_eq!(collected, Channel::ALL.to_vec());
    }
}
