//! # Emulator API
//!
//! Transport agnostic facade over the engine implementing the emulator's external operations. Each
//! operation takes and returns the serde payloads defined in [`delta_if::api`], a transport (HTTP,
//! sockets, the command line tools) only has to move those payloads and map [`ApiError`]s to its
//! own status codes with [`ApiError::status_code`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use std::path::Path;

use delta_if::{
    api::*,
    motion::{GlobalPoint, Pose},
    PinStatus, RegSize,
};

use crate::{
    engine::{catalog::hex_address, Command, Engine},
    store::{motion::MotionParam, points::PointRef, StoreError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DeltaApi {
    engine: Engine,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ApiError {
    /// Error kind as reported in run results, `None` for malformed requests.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::BadRequest(_) => None,
            ApiError::Store(e) => Some(e.kind()),
        }
    }

    /// HTTP style status code for the error.
    pub fn status_code(&self) -> u16 {
        self.kind().map_or(400, kind_status_code)
    }
}

/// HTTP style status code for an error kind.
pub fn kind_status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::RangeError | ErrorKind::InvalidArgument => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::WaitUnsatisfied | ErrorKind::ScriptError => 422,
    }
}

/// HTTP style status code for a run result, 200 when it completed.
pub fn result_status_code(result: &ExecutionResult) -> u16 {
    result.error.as_ref().map_or(200, |e| kind_status_code(e.kind))
}

impl DeltaApi {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Read one input, or a bit field of `length` inputs.
    pub fn read_input(&self, req: &DiRequest) -> Result<DiResponse, ApiError> {
        let store = self.engine.store();

        Ok(match req.length {
            None => DiResponse::Single {
                pin: req.pin,
                status: store.get_input(req.pin)?,
            },
            Some(length) => DiResponse::Multi {
                pin: req.pin,
                length,
                value: store.get_inputs(req.pin, length)?,
            },
        })
    }

    /// Set an output, pulsing it if a delay is given.
    pub fn set_output(&self, req: &DoRequest) -> Result<DoResponse, ApiError> {
        let status: PinStatus = req.status.parse().map_err(StoreError::from)?;
        let store = self.engine.store();

        match req.delay {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(ApiError::BadRequest(format!(
                    "delay must be a non-negative number of seconds (found {})",
                    d
                )))
            }
            _ => (),
        }

        store.set_output(req.pin, status)?;

        let delayed_status = match req.delay {
            Some(d) => {
                self.engine.delay_mode().wait(d);
                store.set_output(req.pin, !status)?;
                Some(!status)
            }
            None => None,
        };

        Ok(DoResponse {
            pin: req.pin,
            status,
            message: format!("DO({}, {}) executed", req.pin, status),
            delayed_status,
        })
    }

    pub fn get_outputs(&self) -> DoStatesResponse {
        DoStatesResponse {
            do_states: self.engine.store().output_states(),
        }
    }

    pub fn read_register(&self, req: &RegReadRequest) -> Result<RegReadResponse, ApiError> {
        let size: RegSize = req.size.parse().map_err(StoreError::from)?;

        Ok(RegReadResponse {
            address: hex_address(req.address),
            size,
            value: self.engine.store().read_register(req.address, size)?,
        })
    }

    pub fn write_register(&self, req: &RegWriteRequest) -> Result<RegWriteResponse, ApiError> {
        let size: RegSize = req.size.parse().map_err(StoreError::from)?;
        let stored = self
            .engine
            .store()
            .write_register(req.address, req.value, size)?;

        Ok(RegWriteResponse {
            address: hex_address(req.address),
            size,
            value: stored,
            message: format!(
                "WriteModbus({}, {}, {}) executed",
                hex_address(req.address),
                size,
                req.value
            ),
        })
    }

    pub fn set_point(&self, req: PointSetRequest) -> Result<PointSetResponse, ApiError> {
        let point = GlobalPoint {
            name: req.name,
            pose: Pose {
                x: req.x,
                y: req.y,
                z: req.z,
                rx: req.rx,
                ry: req.ry,
                rz: req.rz,
            },
            extra: req.extra,
        };
        let name = point.name.clone();

        self.engine.store().set_point(req.point_num, point)?;

        Ok(PointSetResponse {
            point_num: req.point_num,
            message: format!("Global point {} '{}' set", req.point_num, name),
            name,
        })
    }

    pub fn get_point(&self, point_num: i64) -> Result<PointGetResponse, ApiError> {
        let (point_num, data) = self.engine.store().get_point(&PointRef::Num(point_num))?;
        Ok(PointGetResponse { point_num, data })
    }

    pub fn robot_state(&self) -> RobotStateResponse {
        self.engine.store().robot_state()
    }

    /// Set one motion parameter from its kind name, returning the resulting settings.
    pub fn set_motion_param(
        &self,
        req: &MotionParamRequest,
    ) -> Result<MotionParamResponse, ApiError> {
        let param = MotionParam::parse(&req.kind, &req.value)?;
        let store = self.engine.store();
        store.set_motion_param(param)?;

        Ok(MotionParamResponse {
            motion_settings: store.get_motion_params(),
            message: format!("{} executed", param),
        })
    }

    pub fn execute_script(&self, req: &ScriptExecuteRequest) -> ExecutionResult {
        self.engine.run_script(&req.script)
    }

    pub fn execute_commands(&self, commands: &[Command]) -> ExecutionResult {
        self.engine.run_commands(commands)
    }

    /// Validate and execute an uploaded script file.
    pub fn upload_script(
        &self,
        filename: &str,
        contents: &[u8],
    ) -> Result<ScriptUploadResponse, ApiError> {
        if filename.trim().is_empty() {
            return Err(ApiError::BadRequest("no file selected".into()));
        }

        let is_lua = Path::new(filename)
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("lua"));
        if !is_lua {
            return Err(ApiError::BadRequest(format!(
                "{} is not a .lua file",
                filename
            )));
        }

        let script = std::str::from_utf8(contents).map_err(|e| {
            ApiError::BadRequest(format!("{} is not valid UTF-8: {}", filename, e))
        })?;

        info!("Executing uploaded script {}", filename);

        Ok(ScriptUploadResponse {
            filename: filename.to_string(),
            result: self.engine.run_script(script),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::RobotStore;
    use delta_if::{AccurMode, Value};
    use std::sync::Arc;

    fn api() -> DeltaApi {
        DeltaApi::new(Engine::new(Arc::new(RobotStore::new())))
    }

    #[test]
    fn test_outputs() {
        let api = api();

        let resp = api
            .set_output(&DoRequest {
                pin: 2,
                status: "on".into(),
                delay: None,
            })
            .unwrap();
        assert_eq!(resp.status, PinStatus::On);
        assert_eq!(resp.delayed_status, None);
        assert_eq!(api.get_outputs().do_states[&2], PinStatus::On);

        let resp = api
            .set_output(&DoRequest {
                pin: 3,
                status: "ON".into(),
                delay: Some(0.0),
            })
            .unwrap();
        assert_eq!(resp.delayed_status, Some(PinStatus::Off));
        assert_eq!(api.get_outputs().do_states[&3], PinStatus::Off);

        let err = api
            .set_output(&DoRequest {
                pin: 13,
                status: "ON".into(),
                delay: None,
            })
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = api
            .set_output(&DoRequest {
                pin: 1,
                status: "MAYBE".into(),
                delay: None,
            })
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
    }

    #[test]
    fn test_registers() {
        let api = api();

        let resp = api
            .write_register(&RegWriteRequest {
                address: 0x3000,
                size: "DW".into(),
                value: 100_000,
            })
            .unwrap();
        assert_eq!(resp.address, "0x3000");
        assert_eq!(resp.value, 100_000);

        let resp = api
            .read_register(&RegReadRequest {
                address: 0x3000,
                size: "dw".into(),
            })
            .unwrap();
        assert_eq!(resp.value, 100_000);

        let err = api
            .read_register(&RegReadRequest {
                address: 0x2000,
                size: "W".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeError));
    }

    #[test]
    fn test_points() {
        let api = api();

        let resp = api
            .set_point(PointSetRequest {
                point_num: 10,
                name: "DROP".into(),
                x: 1.0,
                y: 2.0,
                z: 3.0,
                rx: 0.0,
                ry: 0.0,
                rz: 45.0,
                extra: vec![],
            })
            .unwrap();
        assert_eq!(resp.name, "DROP");

        let resp = api.get_point(10).unwrap();
        assert_eq!(resp.data.pose.rz, 45.0);

        assert_eq!(api.get_point(11).unwrap_err().status_code(), 404);
        assert_eq!(api.get_point(0).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_motion_params() {
        let api = api();

        let resp = api
            .set_motion_param(&MotionParamRequest {
                kind: "spdl".into(),
                value: Value::Int(250),
            })
            .unwrap();
        assert_eq!(resp.motion_settings.spdl, 250.0);
        assert_eq!(resp.message, "SpdL(250.0 mm/sec) executed");

        let resp = api
            .set_motion_param(&MotionParamRequest {
                kind: "Accur".into(),
                value: Value::from("rough"),
            })
            .unwrap();
        assert_eq!(resp.motion_settings.accur, AccurMode::Rough);
        assert_eq!(api.robot_state().motion_settings.spdl, 250.0);

        let err = api
            .set_motion_param(&MotionParamRequest {
                kind: "Speed".into(),
                value: Value::Int(1),
            })
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));

        let err = api
            .set_motion_param(&MotionParamRequest {
                kind: "SpdJ".into(),
                value: Value::Num(-1.0),
            })
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_upload_validation() {
        let api = api();

        assert!(matches!(
            api.upload_script("", b"DO(1, ON)"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            api.upload_script("job.txt", b"DO(1, ON)"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            api.upload_script("job.lua", &[0xFF, 0xFE]),
            Err(ApiError::BadRequest(_))
        ));

        let resp = api.upload_script("job.LUA", b"DO(1, ON)").unwrap();
        assert_eq!(resp.filename, "job.LUA");
        assert!(resp.result.is_completed());
        assert_eq!(result_status_code(&resp.result), 200);
    }

    #[test]
    fn test_failed_script_status() {
        let api = api();

        let result = api.execute_script(&ScriptExecuteRequest {
            script: "WAIT(\"DI\", 1, ON)".into(),
        });
        assert_eq!(result_status_code(&result), 422);
        assert_eq!(
            result.error.map(|e| e.kind),
            Some(ErrorKind::WaitUnsatisfied)
        );
    }
}
