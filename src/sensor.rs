// Distance sensor on the microcontroller

use std::sync::Arc;

use crate::comm::{CommError, Communicator};
use crate::config::DISTANCE_CONVERSION_FACTOR;

/// Converts raw microcontroller distance readings to meters
pub struct DistanceSensor<C> {
    link: Arc<C>,
    conversion_factor: f32,
}

impl<C: Communicator> DistanceSensor<C> {
    pub fn new(link: Arc<C>) -> Self {
        Self::with_conversion_factor(link, DISTANCE_CONVERSION_FACTOR)
    }

    pub fn with_conversion_factor(link: Arc<C>, conversion_factor: f32) -> Self {
        Self {
            link,
            conversion_factor,
        }
    }

    /// Distance in meters; communication errors are returned to the caller
    pub async fn get_distance(&self) -> Result<f32, CommError> {
        Ok(self.link.request_distance().await? * self.conversion_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::mock::MockLink;

    #[tokio::test]
    async fn test_converts_raw_reading() {
        let link = Arc::new(MockLink::default());
        link.set_raw_distance(Some(150.0));
        let sensor = DistanceSensor::new(link);
        let meters = sensor.get_distance().await.unwrap();
        assert!((meters - 1.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_custom_conversion_factor() {
        let link = Arc::new(MockLink::default());
        link.set_raw_distance(Some(40.0));
        let sensor = DistanceSensor::with_conversion_factor(link, 0.25);
        assert_eq!(sensor.get_distance().await.unwrap(), 10.0);
    }

    #[tokio::test]
    async fn test_propagates_communication_error() {
        let link = Arc::new(MockLink::default());
        let sensor = DistanceSensor::new(link);
        let err = sensor.get_distance().await.unwrap_err();
        assert!(matches!(err, CommError::NoReply { .. }));
    }
}
