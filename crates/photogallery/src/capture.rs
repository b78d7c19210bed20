//! The capture workflow.
//!
//! Taking a photo is a short, strictly sequential chain:
//!
//! ```text
//! RequestingCameraPermission -> RequestingLocation -> AwaitingCamera -> Done
//! ```
//!
//! Each transition is driven by exactly one completion event (a permission
//! answer, a position fix or timeout, a camera result). Any state may jump
//! straight to `Done`. Once `Done` is reached the listener hears about the
//! captured photo, if any, and then `on_finished` fires exactly once.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::providers::{
    CameraOptions, CameraResponse, LocationOptions, Permission, Platform, Providers,
};
use crate::record::Coordinates;

/// Alert title when the camera permission is refused.
pub const PERMISSION_DENIED_TITLE: &str = "Permission denied";

/// Alert body when the camera permission is refused.
pub const PERMISSION_DENIED_MESSAGE: &str = "Cannot use the camera";

/// Alert title when the camera reports an error.
pub const CAMERA_ERROR_TITLE: &str = "Error";

/// Alert body when the camera reports an error without a message.
pub const CAMERA_ERROR_FALLBACK: &str = "Failed to access the camera";

/// Receives the result of a capture.
///
/// Both callbacks are optional; the defaults do nothing.
pub trait CaptureListener {
    /// A photo was taken.
    fn on_captured(&mut self, _uri: &str, _coordinates: Option<Coordinates>) {}

    /// The workflow ended, whatever the outcome. The capture UI should close.
    fn on_finished(&mut self) {}
}

impl CaptureListener for () {}

/// How a capture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Camera permission was refused; nothing else ran.
    PermissionDenied,
    /// The user closed the camera without taking a picture.
    Cancelled,
    /// The camera reported an error.
    Failed {
        /// Provider error code.
        code: String,
        /// Message shown to the user.
        message: String,
    },
    /// The camera returned no asset with a URI.
    NoAsset,
    /// A photo was taken.
    Captured {
        /// Handle to the new image.
        uri: String,
        /// Position resolved before the camera opened.
        coordinates: Option<Coordinates>,
    },
}

impl CaptureOutcome {
    /// Whether a photo was produced.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

/// Where a running capture currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// Waiting for the camera permission answer.
    RequestingCameraPermission,
    /// Waiting for a position fix (or its timeout).
    RequestingLocation,
    /// The camera is open.
    AwaitingCamera {
        /// Position resolved in the previous step.
        coordinates: Option<Coordinates>,
    },
    /// Finished.
    Done(CaptureOutcome),
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestingCameraPermission => write!(f, "requesting_camera_permission"),
            Self::RequestingLocation => write!(f, "requesting_location"),
            Self::AwaitingCamera { .. } => write!(f, "awaiting_camera"),
            Self::Done(_) => write!(f, "done"),
        }
    }
}

/// Static settings of the capture workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Platform, decides whether runtime permissions are requested.
    pub platform: Platform,
    /// Whether to try to geotag photos at all.
    pub location_enabled: bool,
    /// Options for the geolocation provider.
    pub location: LocationOptions,
    /// Options for the camera provider.
    pub camera: CameraOptions,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            location_enabled: true,
            location: LocationOptions::default(),
            camera: CameraOptions::default(),
        }
    }
}

/// Runs captures against a set of providers.
///
/// Only one capture may be in flight per workflow; a second [`run`] while
/// the first has not finished fails with [`Error::CaptureInProgress`].
///
/// [`run`]: CaptureWorkflow::run
#[derive(Debug)]
pub struct CaptureWorkflow {
    providers: Providers,
    settings: CaptureSettings,
    in_flight: AtomicBool,
}

impl CaptureWorkflow {
    /// Create a workflow.
    #[must_use]
    pub fn new(providers: Providers, settings: CaptureSettings) -> Self {
        Self {
            providers,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a capture is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run one capture to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureInProgress`] if another capture is running on
    /// this workflow. In that case no provider is called and the listener
    /// is not notified.
    pub async fn run<L>(&self, listener: &mut L) -> Result<CaptureOutcome>
    where
        L: CaptureListener + ?Sized,
    {
        let _guard = InFlight::acquire(&self.in_flight)?;

        let mut state = CaptureState::RequestingCameraPermission;
        let outcome = loop {
            debug!("Capture state: {}", state);
            state = match state {
                CaptureState::Done(outcome) => break outcome,
                other => self.step(other).await,
            };
        };

        if let CaptureOutcome::Captured { uri, coordinates } = &outcome {
            info!("Captured {}", uri);
            listener.on_captured(uri, *coordinates);
        }
        listener.on_finished();

        Ok(outcome)
    }

    async fn step(&self, state: CaptureState) -> CaptureState {
        match state {
            CaptureState::RequestingCameraPermission => self.check_camera_permission().await,
            CaptureState::RequestingLocation => CaptureState::AwaitingCamera {
                coordinates: self.resolve_location().await,
            },
            CaptureState::AwaitingCamera { coordinates } => self.open_camera(coordinates).await,
            done @ CaptureState::Done(_) => done,
        }
    }

    async fn check_camera_permission(&self) -> CaptureState {
        if !self.settings.platform.has_runtime_permissions() {
            return CaptureState::RequestingLocation;
        }

        match self.providers.permissions.request(Permission::Camera).await {
            Ok(result) if result.is_granted() => CaptureState::RequestingLocation,
            Ok(result) => {
                info!("Camera permission not granted: {:?}", result);
                self.deny()
            }
            Err(e) => {
                warn!("Camera permission request failed: {}", e);
                self.deny()
            }
        }
    }

    fn deny(&self) -> CaptureState {
        self.providers
            .notifier
            .alert(PERMISSION_DENIED_TITLE, PERMISSION_DENIED_MESSAGE);
        CaptureState::Done(CaptureOutcome::PermissionDenied)
    }

    async fn resolve_location(&self) -> Option<Coordinates> {
        if !self.settings.location_enabled {
            return None;
        }

        if self.settings.platform.has_runtime_permissions() {
            match self
                .providers
                .permissions
                .request(Permission::FineLocation)
                .await
            {
                Ok(result) if result.is_granted() => {}
                Ok(result) => {
                    info!("Location permission not granted: {:?}", result);
                    return None;
                }
                Err(e) => {
                    warn!("Location permission request failed: {}", e);
                    return None;
                }
            }
        }

        match self.current_position().await {
            Ok(coords) => Some(coords),
            Err(e) => {
                warn!("Failed to get location: {}", e);
                None
            }
        }
    }

    /// Ask the location provider for a fix, giving up after the configured
    /// timeout.
    async fn current_position(&self) -> Result<Coordinates> {
        let options = self.settings.location;
        let fix = self.providers.location.current_position(&options);
        match tokio::time::timeout(options.timeout, fix).await {
            Ok(position) => position.map(|p| p.coords),
            Err(_) => Err(Error::Timeout {
                operation: format!("current position ({:?})", options.timeout),
            }),
        }
    }

    async fn open_camera(&self, coordinates: Option<Coordinates>) -> CaptureState {
        let outcome = match self.providers.camera.launch(&self.settings.camera).await {
            CameraResponse::Cancelled => {
                info!("User cancelled the camera");
                CaptureOutcome::Cancelled
            }
            CameraResponse::Error { code, message } => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| CAMERA_ERROR_FALLBACK.to_string());
                self.providers.notifier.alert(CAMERA_ERROR_TITLE, &message);
                CaptureOutcome::Failed { code, message }
            }
            CameraResponse::Assets(assets) => {
                match assets.into_iter().next().and_then(|asset| asset.uri) {
                    Some(uri) => CaptureOutcome::Captured { uri, coordinates },
                    None => {
                        debug!("Camera returned no usable asset");
                        CaptureOutcome::NoAsset
                    }
                }
            }
        };
        CaptureState::Done(outcome)
    }
}

/// Marks a workflow busy for as long as it lives.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| Self(flag))
            .map_err(|_| Error::CaptureInProgress)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use crate::providers::{
        Asset, CameraProvider, LocationProvider, Notifier, PermissionProvider, PermissionResult,
        Position,
    };

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct FakePermissions {
        camera: PermissionResult,
        location: PermissionResult,
        log: CallLog,
    }

    #[async_trait::async_trait]
    impl PermissionProvider for FakePermissions {
        async fn request(&self, permission: Permission) -> Result<PermissionResult> {
            self.log
                .lock()
                .unwrap()
                .push(format!("permission:{permission}"));
            Ok(match permission {
                Permission::Camera => self.camera,
                Permission::FineLocation => self.location,
            })
        }
    }

    enum LocationBehavior {
        Fix(Coordinates),
        Fail,
        Hang,
    }

    struct FakeLocation {
        behavior: LocationBehavior,
        log: CallLog,
    }

    #[async_trait::async_trait]
    impl LocationProvider for FakeLocation {
        async fn current_position(&self, _options: &LocationOptions) -> Result<Position> {
            self.log.lock().unwrap().push("location".to_string());
            match self.behavior {
                LocationBehavior::Fix(coords) => Ok(Position { coords }),
                LocationBehavior::Fail => Err(Error::location("Location error")),
                LocationBehavior::Hang => std::future::pending().await,
            }
        }
    }

    struct FakeCamera {
        response: CameraResponse,
        log: CallLog,
        gate: Option<Arc<tokio::sync::Notify>>,
    }

    #[async_trait::async_trait]
    impl CameraProvider for FakeCamera {
        async fn launch(&self, options: &CameraOptions) -> CameraResponse {
            self.log
                .lock()
                .unwrap()
                .push(format!("camera:{:?}", options.camera_type));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.response.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn alert(&self, title: &str, message: &str) {
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        captured: Vec<(String, Option<Coordinates>)>,
        finished: usize,
    }

    impl CaptureListener for RecordingListener {
        fn on_captured(&mut self, uri: &str, coordinates: Option<Coordinates>) {
            self.captured.push((uri.to_string(), coordinates));
        }

        fn on_finished(&mut self) {
            self.finished += 1;
        }
    }

    struct Harness {
        workflow: CaptureWorkflow,
        notifier: Arc<RecordingNotifier>,
        log: CallLog,
    }

    struct Script {
        platform: Platform,
        camera_permission: PermissionResult,
        location_permission: PermissionResult,
        location: LocationBehavior,
        camera: CameraResponse,
        gate: Option<Arc<tokio::sync::Notify>>,
        timeout: Duration,
    }

    impl Default for Script {
        fn default() -> Self {
            Self {
                platform: Platform::Android,
                camera_permission: PermissionResult::Granted,
                location_permission: PermissionResult::Granted,
                location: LocationBehavior::Fix(Coordinates::new(10.0, 20.0)),
                camera: CameraResponse::Assets(vec![Asset::from_uri("photo-uri")]),
                gate: None,
                timeout: Duration::from_millis(10_000),
            }
        }
    }

    fn harness(script: Script) -> Harness {
        let log: CallLog = Arc::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let providers = Providers {
            permissions: Arc::new(FakePermissions {
                camera: script.camera_permission,
                location: script.location_permission,
                log: log.clone(),
            }),
            location: Arc::new(FakeLocation {
                behavior: script.location,
                log: log.clone(),
            }),
            camera: Arc::new(FakeCamera {
                response: script.camera,
                log: log.clone(),
                gate: script.gate,
            }),
            notifier: notifier.clone(),
        };
        let settings = CaptureSettings {
            platform: script.platform,
            location: LocationOptions {
                timeout: script.timeout,
                ..LocationOptions::default()
            },
            ..CaptureSettings::default()
        };
        Harness {
            workflow: CaptureWorkflow::new(providers, settings),
            notifier,
            log,
        }
    }

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_successful_capture_with_location() {
        let h = harness(Script::default());
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Captured {
                uri: "photo-uri".to_string(),
                coordinates: Some(Coordinates::new(10.0, 20.0)),
            }
        );
        assert_eq!(
            listener.captured,
            vec![("photo-uri".to_string(), Some(Coordinates::new(10.0, 20.0)))]
        );
        assert_eq!(listener.finished, 1);
        assert!(h.notifier.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let h = harness(Script::default());
        h.workflow.run(&mut ()).await.unwrap();

        assert_eq!(
            calls(&h.log),
            vec![
                "permission:camera",
                "permission:fine_location",
                "location",
                "camera:Back",
            ]
        );
    }

    #[tokio::test]
    async fn test_camera_permission_denied() {
        let h = harness(Script {
            camera_permission: PermissionResult::Denied,
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::PermissionDenied);
        assert!(listener.captured.is_empty());
        assert_eq!(listener.finished, 1);
        assert_eq!(calls(&h.log), vec!["permission:camera"]);
        assert_eq!(
            *h.notifier.alerts.lock().unwrap(),
            vec![(
                PERMISSION_DENIED_TITLE.to_string(),
                PERMISSION_DENIED_MESSAGE.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_never_ask_again_counts_as_denied() {
        let h = harness(Script {
            camera_permission: PermissionResult::NeverAskAgain,
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::PermissionDenied);
        assert_eq!(listener.finished, 1);
    }

    #[tokio::test]
    async fn test_no_permission_requests_off_android() {
        for platform in [Platform::Ios, Platform::Desktop] {
            let h = harness(Script {
                platform,
                camera_permission: PermissionResult::Denied,
                location_permission: PermissionResult::Denied,
                ..Script::default()
            });
            let mut listener = RecordingListener::default();

            let outcome = h.workflow.run(&mut listener).await.unwrap();

            assert!(outcome.is_captured());
            assert_eq!(calls(&h.log), vec!["location", "camera:Back"]);
            assert_eq!(
                listener.captured[0].1,
                Some(Coordinates::new(10.0, 20.0))
            );
        }
    }

    #[tokio::test]
    async fn test_location_permission_denied_continues_without_coords() {
        let h = harness(Script {
            location_permission: PermissionResult::Denied,
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(listener.captured, vec![("photo-uri".to_string(), None)]);
        assert!(!calls(&h.log).contains(&"location".to_string()));
        assert_eq!(listener.finished, 1);
    }

    #[tokio::test]
    async fn test_location_failure_continues_without_coords() {
        let h = harness(Script {
            location: LocationBehavior::Fail,
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Captured {
                uri: "photo-uri".to_string(),
                coordinates: None,
            }
        );
        assert_eq!(listener.captured, vec![("photo-uri".to_string(), None)]);
        assert_eq!(listener.finished, 1);
    }

    #[tokio::test]
    async fn test_location_timeout_is_bounded() {
        let h = harness(Script {
            location: LocationBehavior::Hang,
            timeout: Duration::from_millis(50),
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let started = Instant::now();
        h.workflow.run(&mut listener).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(listener.captured, vec![("photo-uri".to_string(), None)]);
        assert_eq!(listener.finished, 1);
    }

    #[tokio::test]
    async fn test_hanging_location_reports_timeout() {
        let h = harness(Script {
            location: LocationBehavior::Hang,
            timeout: Duration::from_millis(20),
            ..Script::default()
        });

        let err = h.workflow.current_position().await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.to_string().contains("current position"));
    }

    #[tokio::test]
    async fn test_location_disabled_skips_provider() {
        let mut h = harness(Script::default());
        h.workflow.settings.location_enabled = false;
        let mut listener = RecordingListener::default();

        h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(calls(&h.log), vec!["permission:camera", "camera:Back"]);
        assert_eq!(listener.captured, vec![("photo-uri".to_string(), None)]);
    }

    #[tokio::test]
    async fn test_camera_cancelled() {
        let h = harness(Script {
            camera: CameraResponse::Cancelled,
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::Cancelled);
        assert!(listener.captured.is_empty());
        assert_eq!(listener.finished, 1);
        assert!(h.notifier.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_camera_error_alerts_with_message() {
        let h = harness(Script {
            camera: CameraResponse::Error {
                code: "ERROR".to_string(),
                message: Some("Camera error".to_string()),
            },
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Failed {
                code: "ERROR".to_string(),
                message: "Camera error".to_string(),
            }
        );
        assert_eq!(
            *h.notifier.alerts.lock().unwrap(),
            vec![("Error".to_string(), "Camera error".to_string())]
        );
        assert!(listener.captured.is_empty());
        assert_eq!(listener.finished, 1);
    }

    #[tokio::test]
    async fn test_camera_error_fallback_message() {
        let h = harness(Script {
            camera: CameraResponse::Error {
                code: "ERROR".to_string(),
                message: None,
            },
            ..Script::default()
        });

        h.workflow.run(&mut ()).await.unwrap();

        assert_eq!(
            *h.notifier.alerts.lock().unwrap(),
            vec![(
                CAMERA_ERROR_TITLE.to_string(),
                CAMERA_ERROR_FALLBACK.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_assets_produce_nothing() {
        let h = harness(Script {
            camera: CameraResponse::Assets(vec![]),
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::NoAsset);
        assert!(listener.captured.is_empty());
        assert_eq!(listener.finished, 1);
    }

    #[tokio::test]
    async fn test_asset_without_uri_produces_nothing() {
        let h = harness(Script {
            camera: CameraResponse::Assets(vec![Asset::default(), Asset::from_uri("second")]),
            ..Script::default()
        });
        let mut listener = RecordingListener::default();

        let outcome = h.workflow.run(&mut listener).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::NoAsset);
        assert!(listener.captured.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_run_is_rejected() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let h = harness(Script {
            gate: Some(gate.clone()),
            ..Script::default()
        });
        let mut first = RecordingListener::default();
        let mut second = RecordingListener::default();

        let (a, b, ()) = tokio::join!(
            h.workflow.run(&mut first),
            async {
                tokio::task::yield_now().await;
                h.workflow.run(&mut second).await
            },
            async {
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
                gate.notify_one();
            }
        );

        assert!(a.unwrap().is_captured());
        assert!(matches!(b, Err(Error::CaptureInProgress)));
        assert_eq!(first.finished, 1);
        assert_eq!(second.finished, 0);
        assert!(second.captured.is_empty());
        assert!(!h.workflow.is_running());
    }

    #[tokio::test]
    async fn test_workflow_reusable_after_finish() {
        let h = harness(Script::default());
        h.workflow.run(&mut ()).await.unwrap();
        assert!(!h.workflow.is_running());
        assert!(h.workflow.run(&mut ()).await.is_ok());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            CaptureState::RequestingCameraPermission.to_string(),
            "requesting_camera_permission"
        );
        assert_eq!(
            CaptureState::AwaitingCamera { coordinates: None }.to_string(),
            "awaiting_camera"
        );
        assert_eq!(
            CaptureState::Done(CaptureOutcome::Cancelled).to_string(),
            "done"
        );
    }
}
