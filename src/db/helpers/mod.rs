use anyhow::{bail, Result};

use crate::models::Channel;

/// Channel intensities are finite and non-negative.
pub fn check_intensity(value: f64, channel: Channel) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        bail!("{} contains invalid intensity {value}", channel.column());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_non_finite() {
        assert_eq!(check_intensity(0.0, Channel::Sad).unwrap(), 0.0);
        assert_eq!(check_intensity(0.42, Channel::Sad).unwrap(), 0.42);

        let err = check_intensity(-0.1, Channel::Angry).unwrap_err();
        assert!(err.to_string().contains("angry"));
        assert!(check_intensity(f64::NAN, Channel::Happy).is_err());
        assert!(check_intensity(f64::INFINITY, Channel::Happy).is_err());
    }
}
