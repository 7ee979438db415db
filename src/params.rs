//! Tuning parameters for the waypoint navigator and the collaborators that
//! bound it.
//!
//! Every group deserialises from TOML with missing fields taking the stock
//! multicopter defaults, so an empty file is a valid configuration.

use std::fs::read_to_string;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// An error that occurs while loading a parameter file.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Cannot load the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

/// Waypoint navigation limits (WPNAV_*).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WpNavParams {
    /// Horizontal cruise speed, cm/s.
    pub speed_cms: f64,
    pub speed_up_cms: f64,
    pub speed_down_cms: f64,
    /// Horizontal acceleration, cm/s/s.
    pub accel_cmss: f64,
    pub accel_z_cmss: f64,
    /// Corner acceleration limit, 0 to derive it from the lean angle.
    pub accel_corner_cmss: f64,
    /// Waypoint acceptance radius, cm.
    pub radius_cm: f64,
    /// Jerk limit, m/s/s/s.
    pub jerk_msss: f64,
}

impl Default for WpNavParams {
    fn default() -> Self {
        Self {
            speed_cms: 1000.0,
            speed_up_cms: 250.0,
            speed_down_cms: 150.0,
            accel_cmss: 250.0,
            accel_z_cmss: 100.0,
            accel_corner_cmss: 0.0,
            radius_cm: 200.0,
            jerk_msss: 1.0,
        }
    }
}

/// Attitude controller limits (ATC_* and ANGLE_MAX).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttitudeParams {
    /// Roll angular acceleration, centideg/s/s.
    pub accel_roll_max_cdss: f64,
    pub accel_pitch_max_cdss: f64,
    /// Roll rate, deg/s. 0 is unlimited.
    pub rate_roll_max_degs: f64,
    pub rate_pitch_max_degs: f64,
    /// Lean angle limit, centideg.
    pub angle_max_cd: f64,
    /// Input shaping time constant, s.
    pub input_tc: f64,
    pub rate_ff_enabled: bool,
}

impl Default for AttitudeParams {
    fn default() -> Self {
        Self {
            accel_roll_max_cdss: 110_000.0,
            accel_pitch_max_cdss: 110_000.0,
            rate_roll_max_degs: 0.0,
            rate_pitch_max_degs: 0.0,
            angle_max_cd: 3000.0,
            input_tc: 0.15,
            rate_ff_enabled: true,
        }
    }
}

/// Position controller limits (PSC_*).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PosControlParams {
    pub jerk_xy_msss: f64,
    pub jerk_z_msss: f64,
    /// Lean angle limit in degrees, 0 to use the attitude limit.
    pub angle_max_deg: f64,
    /// Vertical accel controller target filter, Hz.
    pub accel_z_filt_t_hz: f64,
    /// Vertical accel controller error filter, Hz.
    pub accel_z_filt_e_hz: f64,
}

impl Default for PosControlParams {
    fn default() -> Self {
        Self {
            jerk_xy_msss: 5.0,
            jerk_z_msss: 5.0,
            angle_max_deg: 0.0,
            accel_z_filt_t_hz: 0.0,
            accel_z_filt_e_hz: 20.0,
        }
    }
}

/// Full parameter set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Params {
    pub wpnav: WpNavParams,
    pub attitude: AttitudeParams,
    pub pos_control: PosControlParams,
}

/// Load a parameter file.
pub fn load<P>(path: impl AsRef<Path>) -> Result<P, ParamsError>
where
    P: DeserializeOwned,
{
    let params_str = read_to_string(path).map_err(ParamsError::FileLoadError)?;
    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, ParamsError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(ParamsError::DeserialiseError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let params: Params = from_str("").unwrap();
        assert_eq!(params, Params::default());
        assert_eq!(params.wpnav.speed_cms, 1000.0);
        assert!(params.attitude.rate_ff_enabled);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let params: Params = from_str(
            r#"
            [wpnav]
            speed_cms = 500.0
            radius_cm = 50.0

            [attitude]
            rate_ff_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(params.wpnav.speed_cms, 500.0);
        assert_eq!(params.wpnav.radius_cm, 50.0);
        assert_eq!(params.wpnav.accel_cmss, 250.0);
        assert!(!params.attitude.rate_ff_enabled);
        assert_eq!(params.pos_control, PosControlParams::default());
    }

    #[test]
    fn single_group_loads_on_its_own() {
        let wpnav: WpNavParams = from_str("jerk_msss = 2.5").unwrap();
        assert_eq!(wpnav.jerk_msss, 2.5);
    }

    #[test]
    fn bad_input_is_reported() {
        let result: Result<Params, _> = from_str("[wpnav]\nspeed_cms = \"fast\"");
        assert!(matches!(result, Err(ParamsError::DeserialiseError(_))));

        let result: Result<Params, _> = load("/nonexistent/scurve_wpnav/params.toml");
        assert!(matches!(result, Err(ParamsError::FileLoadError(_))));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join("scurve_wpnav_params_test.toml");
        std::fs::write(&path, "[pos_control]\njerk_xy_msss = 8.0\n").unwrap();
        let params: Params = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(params.pos_control.jerk_xy_msss, 8.0);
    }
}
