//! Motor channel mapping
//!
//! Maps each logical motor (1..N) to the servo output function that carries
//! its command and the ESC telemetry slot that reports its RPM. The map is
//! built once at startup and never changes afterwards.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Maximum number of monitored motors
pub const MAX_MOTORS: usize = 8;

/// Output function id of Motor1; MotorN is `MOTOR1_FUNCTION + N - 1`
pub const MOTOR1_FUNCTION: u8 = 33;

/// One physical motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorChannel {
    /// Servo output function carrying the motor command
    pub function_id: u8,
    /// ESC telemetry slot reporting the motor RPM
    pub rpm_sensor_id: u8,
}

/// Ordered, immutable set of motor channels
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorMap {
    channels: Vec<MotorChannel, MAX_MOTORS>,
}

impl MotorMap {
    /// Build the map from parallel lists of function ids and sensor ids
    ///
    /// Entry `i` of each list describes motor `i + 1`.
    pub fn new(function_ids: &[u8], rpm_sensor_ids: &[u8]) -> Result<Self, ConfigError> {
        if function_ids.len() != rpm_sensor_ids.len() {
            return Err(ConfigError::ChannelCountMismatch {
                functions: function_ids.len(),
                sensors: rpm_sensor_ids.len(),
            });
        }
        if function_ids.is_empty() {
            return Err(ConfigError::NoMotors);
        }

        let mut channels = Vec::new();
        for (&function_id, &rpm_sensor_id) in function_ids.iter().zip(rpm_sensor_ids) {
            channels
                .push(MotorChannel {
                    function_id,
                    rpm_sensor_id,
                })
                .map_err(|_| ConfigError::TooManyMotors)?;
        }

        Ok(Self { channels })
    }

    /// Standard layout: MotorN on function `MOTOR1_FUNCTION + N - 1`,
    /// reporting on ESC telemetry slot `N - 1`
    pub fn sequential(count: u8) -> Result<Self, ConfigError> {
        if count as usize > MAX_MOTORS {
            return Err(ConfigError::TooManyMotors);
        }
        let mut functions = [0u8; MAX_MOTORS];
        let mut sensors = [0u8; MAX_MOTORS];
        for i in 0..count {
            functions[i as usize] = MOTOR1_FUNCTION + i;
            sensors[i as usize] = i;
        }
        Self::new(&functions[..count as usize], &sensors[..count as usize])
    }

    /// Number of motors
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false for a successfully built map
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channels in motor order (index 0 is motor 1)
    pub fn channels(&self) -> &[MotorChannel] {
        &self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_lists() {
        let map = MotorMap::new(&[33, 34, 35, 36], &[0, 1, 2, 3]).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(
            map.channels()[2],
            MotorChannel {
                function_id: 35,
                rpm_sensor_id: 2
            }
        );
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        assert_eq!(
            MotorMap::new(&[33, 34, 35, 36], &[0, 1, 2]),
            Err(ConfigError::ChannelCountMismatch {
                functions: 4,
                sensors: 3
            })
        );
    }

    #[test]
    fn test_empty_and_oversized_maps() {
        assert_eq!(MotorMap::new(&[], &[]), Err(ConfigError::NoMotors));

        let ids = [0u8; MAX_MOTORS + 1];
        assert_eq!(MotorMap::new(&ids, &ids), Err(ConfigError::TooManyMotors));
        assert_eq!(
            MotorMap::sequential(MAX_MOTORS as u8 + 1),
            Err(ConfigError::TooManyMotors)
        );
    }

    #[test]
    fn test_sequential_quad() {
        let map = MotorMap::sequential(4).unwrap();
        assert_eq!(map, MotorMap::new(&[33, 34, 35, 36], &[0, 1, 2, 3]).unwrap());
    }
}
