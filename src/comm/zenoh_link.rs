// Zenoh transport to the microcontroller bridge
//
// Motor commands are published on TOPIC_RT_MOTORS; distance readings are
// requested with a query on TOPIC_RT_DISTANCE.

use std::time::Duration;

use tracing::debug;
use zenoh::Session;

use super::{CommError, Communicator};
use crate::config::{DISTANCE_QUERY_TIMEOUT, TOPIC_RT_DISTANCE, TOPIC_RT_MOTORS};
use crate::messages::{MotorCommand, RawDistance};

/// Communicator backed by a zenoh session
pub struct ZenohLink {
    session: Session,
    query_timeout: Duration,
}

impl ZenohLink {
    pub fn new(session: Session) -> Self {
        Self::with_query_timeout(session, DISTANCE_QUERY_TIMEOUT)
    }

    pub fn with_query_timeout(session: Session, query_timeout: Duration) -> Self {
        Self {
            session,
            query_timeout,
        }
    }
}

impl Communicator for ZenohLink {
    async fn send_powers(&self, power_left: f32, power_right: f32) -> Result<(), CommError> {
        let cmd = MotorCommand::from_powers(power_left, power_right);
        let payload = serde_json::to_string(&cmd)?;

        self.session
            .put(TOPIC_RT_MOTORS, payload)
            .await
            .map_err(CommError::transport)
    }

    async fn request_distance(&self) -> Result<f32, CommError> {
        let replies = self
            .session
            .get(TOPIC_RT_DISTANCE)
            .timeout(self.query_timeout)
            .await
            .map_err(CommError::transport)?;

        // First reply wins; the channel closes empty on timeout
        let reply = replies
            .recv_async()
            .await
            .map_err(|_| CommError::NoReply {
                key: TOPIC_RT_DISTANCE,
            })?;

        match reply.result() {
            Ok(sample) => {
                let payload = sample.payload().to_bytes();
                let distance: RawDistance = serde_json::from_slice(&payload)?;
                debug!("Raw distance: {}", distance.raw);
                Ok(distance.raw)
            }
            Err(err) => Err(CommError::Rejected {
                key: TOPIC_RT_DISTANCE,
                reason: format!("{:?}", err),
            }),
        }
    }
}
