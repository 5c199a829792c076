use super::*;
use crate::camera::{CameraPlatform, FlashMode, MockCameraPlatform, MockCaptureBehavior, Size};
use crate::config::DemocamConfig;
use crate::error::{CameraError, DemocamError, PermissionError};
use crate::events::{Control, ScreenEvent};
use crate::lifecycle::LifecycleState;
use crate::notice::{ChannelNotifier, Notice, NoticeDuration};
use crate::permissions::StaticPermissionProvider;
use crate::surface::HeadlessSurface;
use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

struct Harness {
    coordinator: CaptureCoordinator,
    camera: Arc<MockCameraPlatform>,
    permissions: Arc<StaticPermissionProvider>,
    surface: Arc<HeadlessSurface>,
    notices: mpsc::UnboundedReceiver<Notice>,
    temp_dir: TempDir,
}

impl Harness {
    fn next_notice(&mut self) -> Notice {
        self.notices.try_recv().expect("expected a notice")
    }

    fn assert_no_notice(&mut self) {
        assert!(self.notices.try_recv().is_err());
    }
}

fn create_test_config(root: &Path) -> DemocamConfig {
    let mut config = DemocamConfig::default();
    config.storage.root = root.to_string_lossy().to_string();
    config.camera.capture_timeout_seconds = 1;
    config.surface.resolution = (640, 480);
    config
}

fn create_harness(permissions: StaticPermissionProvider) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    create_harness_with(permissions, create_test_config(temp_dir.path()), temp_dir)
}

fn create_harness_with(
    permissions: StaticPermissionProvider,
    config: DemocamConfig,
    temp_dir: TempDir,
) -> Harness {
    let camera = Arc::new(MockCameraPlatform::new());
    let permissions = Arc::new(permissions);
    let surface = Arc::new(HeadlessSurface::new(
        Size::new(config.surface.resolution.0, config.surface.resolution.1),
        config.surface.rotation,
    ));
    let (notifier, notices) = ChannelNotifier::new();

    let coordinator = CaptureCoordinator::builder()
        .config(config)
        .camera(camera.clone())
        .permissions(permissions.clone())
        .surface(surface.clone())
        .notifier(Arc::new(notifier))
        .build()
        .unwrap();

    Harness {
        coordinator,
        camera,
        permissions,
        surface,
        notices,
        temp_dir,
    }
}

fn bound_harness() -> Harness {
    let mut harness = create_harness(StaticPermissionProvider::granting_all());
    harness.coordinator.on_create().unwrap();
    harness
}

#[tokio::test]
async fn test_granted_permissions_bind_once_without_request() {
    let harness = bound_harness();

    assert_eq!(harness.coordinator.state(), ScreenState::Bound);
    assert_eq!(harness.camera.bind_count(), 1);
    assert_eq!(harness.permissions.request_count(), 0);
    assert_eq!(harness.coordinator.lifecycle_state(), LifecycleState::Visible);
    assert_eq!(harness.camera.running_count(), 1);
}

#[tokio::test]
async fn test_denied_permissions_close_screen_without_binding() {
    let mut harness = create_harness(StaticPermissionProvider::denying_all());

    harness.coordinator.on_create().unwrap();
    assert_eq!(
        harness.coordinator.state(),
        ScreenState::AwaitingPermissions
    );

    match harness.coordinator.pump().await {
        Err(DemocamError::Permission(PermissionError::Denied { missing })) => {
            assert_eq!(missing, vec!["CAMERA", "WRITE_EXTERNAL_STORAGE"]);
        }
        other => panic!("Expected a permission denial, got {:?}", other),
    }

    assert_eq!(harness.coordinator.state(), ScreenState::Finished);
    assert_eq!(
        harness.coordinator.exit_reason(),
        Some(&ExitReason::PermissionsDenied)
    );
    assert_eq!(ExitReason::PermissionsDenied.exit_code(), 1);
    assert_eq!(harness.camera.bind_count(), 0);
    assert_eq!(harness.permissions.request_count(), 1);
    assert_eq!(
        harness.coordinator.lifecycle_state(),
        LifecycleState::Destroyed
    );

    let notice = harness.next_notice();
    assert_eq!(notice.message, "Permissions not granted by the user.");
    assert_eq!(notice.duration, NoticeDuration::Short);
}

#[tokio::test]
async fn test_permissions_granted_through_request_bind_camera() {
    let mut harness =
        create_harness(StaticPermissionProvider::denying_all().with_grant_on_request(true));

    harness.coordinator.on_create().unwrap();
    assert_eq!(harness.camera.bind_count(), 0);

    harness.coordinator.pump().await.unwrap();

    assert_eq!(harness.coordinator.state(), ScreenState::Bound);
    assert_eq!(harness.camera.bind_count(), 1);
    harness.assert_no_notice();
}

#[tokio::test]
async fn test_bind_twice_leaves_single_binding() {
    let mut harness = bound_harness();
    let first = harness.coordinator.bound_use_cases().unwrap();

    harness.coordinator.bind_camera().unwrap();
    let second = harness.coordinator.bound_use_cases().unwrap();

    assert_ne!(first, second);
    assert_eq!(harness.camera.bound_preview_count(), 1);
    assert_eq!(harness.camera.bound_capture_count(), 1);
    assert_eq!(harness.camera.unbind_all_count(), 2);
    assert!(harness.camera.capture_config(first.image_capture).is_none());
    assert_eq!(harness.coordinator.stats().binds, 2);
}

#[tokio::test]
async fn test_bind_configures_use_cases_from_surface() {
    let harness = bound_harness();
    let use_cases = harness.coordinator.bound_use_cases().unwrap();

    let preview = harness.camera.preview_config(use_cases.preview).unwrap();
    assert_eq!(preview.target_resolution, Size::new(640, 480));
    assert_eq!(
        (
            preview.target_aspect_ratio.numerator,
            preview.target_aspect_ratio.denominator
        ),
        (4, 3)
    );

    let capture = harness
        .camera
        .capture_config(use_cases.image_capture)
        .unwrap();
    assert_eq!(capture.capture_mode, crate::camera::CaptureMode::MinLatency);
    assert_eq!(capture.lens_facing, crate::camera::LensFacing::Back);
    assert_eq!(capture.flash_mode, FlashMode::Off);
}

#[tokio::test]
async fn test_unmeasured_surface_fails_bind() {
    let mut harness = create_harness(StaticPermissionProvider::granting_all());
    harness.surface.set_size(Size::new(0, 0));

    let result = harness.coordinator.on_create();

    assert!(matches!(
        result,
        Err(DemocamError::Camera(CameraError::UnmeasuredSurface { .. }))
    ));
    assert_eq!(harness.coordinator.state(), ScreenState::Unbound);
    assert_eq!(harness.next_notice().message, "Camera unavailable");
}

#[tokio::test]
async fn test_toggle_flash_twice_restores_state() {
    let mut harness = bound_harness();
    let capture_id = harness.coordinator.bound_use_cases().unwrap().image_capture;
    let original = harness.coordinator.flash_mode();

    harness.coordinator.toggle_flash().unwrap();
    assert_eq!(harness.coordinator.flash_mode(), FlashMode::On);
    assert_eq!(harness.camera.flash_mode(capture_id), Some(FlashMode::On));
    assert_eq!(harness.next_notice().message, "Flash Enable");

    harness.coordinator.toggle_flash().unwrap();
    assert_eq!(harness.coordinator.flash_mode(), original);
    assert_eq!(harness.camera.flash_mode(capture_id), Some(FlashMode::Off));
    assert_eq!(harness.next_notice().message, "Flash Disable");

    assert_eq!(harness.camera.flash_history().len(), 2);
}

#[tokio::test]
async fn test_flash_failure_keeps_state() {
    let mut harness = bound_harness();
    harness.camera.unbind_all();

    let result = harness.coordinator.toggle_flash();

    assert!(matches!(
        result,
        Err(DemocamError::Camera(CameraError::Flash { .. }))
    ));
    assert_eq!(harness.coordinator.flash_mode(), FlashMode::Off);
    assert_eq!(harness.next_notice().message, "Flash unavailable");
}

#[tokio::test]
async fn test_rebind_keeps_flash_state() {
    let mut harness = bound_harness();
    harness.coordinator.toggle_flash().unwrap();

    harness.coordinator.bind_camera().unwrap();
    let capture_id = harness.coordinator.bound_use_cases().unwrap().image_capture;

    assert_eq!(harness.camera.flash_mode(capture_id), Some(FlashMode::On));
}

#[tokio::test]
async fn test_successful_capture_reports_saved_path() {
    let mut harness = bound_harness();

    harness.coordinator.take_photo().unwrap();
    assert!(harness.coordinator.is_capture_in_flight());

    harness.coordinator.pump().await.unwrap();
    assert!(!harness.coordinator.is_capture_in_flight());

    let captures = harness.camera.captures();
    assert_eq!(captures.len(), 1);
    let path = &captures[0].destination;

    assert!(path.is_absolute());
    assert!(path.parent().unwrap().ends_with("Demo"));
    let expected_root = harness.temp_dir.path().canonicalize().unwrap();
    assert_eq!(path.parent().unwrap().parent().unwrap(), expected_root);

    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    let stamp = file_name.strip_suffix("Image.jpg").unwrap();
    assert!(NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.f").is_ok());

    assert_eq!(std::fs::read(path).unwrap(), b"mock jpeg");

    let notice = harness.next_notice();
    assert_eq!(notice.message, format!("Pic captured at {}", path.display()));
    assert_eq!(notice.duration, NoticeDuration::Long);
    assert_eq!(harness.coordinator.stats().captures_succeeded, 1);
}

#[tokio::test]
async fn test_capture_carries_flash_state() {
    let mut harness = bound_harness();
    harness.coordinator.toggle_flash().unwrap();

    harness.coordinator.take_photo().unwrap();
    harness.coordinator.pump().await.unwrap();

    assert_eq!(harness.camera.captures()[0].flash_mode, FlashMode::On);
}

#[tokio::test]
async fn test_overlapping_capture_is_rejected() {
    let mut harness = bound_harness();
    harness.camera.set_capture_behavior(MockCaptureBehavior::Hang);

    harness.coordinator.take_photo().unwrap();
    let result = harness.coordinator.take_photo();

    assert!(matches!(
        result,
        Err(DemocamError::Camera(CameraError::CaptureInFlight { .. }))
    ));
    assert_eq!(harness.coordinator.stats().taps_rejected, 1);
    assert_eq!(harness.coordinator.stats().captures_started, 1);
    assert_eq!(harness.next_notice().message, "Capture already in progress");
}

#[tokio::test]
async fn test_hung_capture_times_out() {
    let mut harness = bound_harness();
    harness.camera.set_capture_behavior(MockCaptureBehavior::Hang);

    harness.coordinator.take_photo().unwrap();
    let destination = harness
        .coordinator
        .in_flight_request()
        .unwrap()
        .destination
        .clone();

    harness.coordinator.pump().await.unwrap();

    assert!(!harness.coordinator.is_capture_in_flight());
    assert_eq!(harness.coordinator.stats().captures_failed, 1);
    assert!(!destination.exists());

    let notice = harness.next_notice();
    assert_eq!(
        notice.message,
        format!("Pic captured Failed at {}", destination.display())
    );

    // The screen accepts a new capture afterwards
    harness
        .camera
        .set_capture_behavior(MockCaptureBehavior::Succeed);
    harness.coordinator.take_photo().unwrap();
}

#[tokio::test]
async fn test_failed_capture_reports_intended_path() {
    let mut harness = bound_harness();
    harness.camera.set_capture_behavior(MockCaptureBehavior::Fail {
        message: "sensor error".to_string(),
        cause: Some("device busy".to_string()),
    });

    harness.coordinator.take_photo().unwrap();
    harness.coordinator.pump().await.unwrap();

    let intended = harness.camera.captures()[0].destination.clone();
    let notice = harness.next_notice();
    assert_eq!(
        notice.message,
        format!("Pic captured Failed at {}", intended.display())
    );
    assert_eq!(harness.coordinator.stats().captures_failed, 1);
}

#[tokio::test]
async fn test_finish_cancels_capture_in_flight() {
    let mut harness = bound_harness();
    harness.camera.set_capture_behavior(MockCaptureBehavior::Hang);

    harness.coordinator.take_photo().unwrap();
    let destination = harness
        .coordinator
        .in_flight_request()
        .unwrap()
        .destination
        .clone();
    harness.coordinator.handle_event(ScreenEvent::Close).unwrap();

    assert_eq!(harness.coordinator.state(), ScreenState::Finished);
    assert_eq!(harness.camera.bound_capture_count(), 0);
    assert_eq!(harness.coordinator.stats().captures_cancelled, 1);
    assert!(!harness.coordinator.is_capture_in_flight());
    assert!(!destination.exists());

    // The late cancellation completion is not counted twice
    harness.coordinator.pump().await.unwrap();
    assert_eq!(harness.coordinator.stats().captures_cancelled, 1);
    harness.assert_no_notice();
}

#[tokio::test]
async fn test_run_leaves_no_placeholder_when_closed_mid_capture() {
    let harness = create_harness(StaticPermissionProvider::granting_all());
    harness.camera.set_capture_behavior(MockCaptureBehavior::Hang);
    let Harness {
        mut coordinator,
        camera,
        ..
    } = harness;

    let events = coordinator.events();
    events
        .send(ScreenEvent::Tap(Control::CaptureButton))
        .unwrap();
    events.send(ScreenEvent::Close).unwrap();

    let reason = coordinator.run().await.unwrap();

    assert_eq!(reason, ExitReason::UserRequest);
    assert_eq!(camera.bound_capture_count(), 0);
    assert_eq!(coordinator.stats().captures_started, 1);
    assert_eq!(coordinator.stats().captures_cancelled, 1);

    let leftovers: Vec<_> = std::fs::read_dir(coordinator.storage().capture_dir())
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
}

#[tokio::test]
async fn test_directory_failure_aborts_capture() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let config = create_test_config(&blocker);

    let mut harness =
        create_harness_with(StaticPermissionProvider::granting_all(), config, temp_dir);
    harness.coordinator.on_create().unwrap();

    let result = harness.coordinator.take_photo();

    assert!(matches!(result, Err(DemocamError::Storage(_))));
    assert!(!harness.coordinator.is_capture_in_flight());
    assert_eq!(harness.coordinator.stats().captures_started, 0);
    assert!(harness.camera.captures().is_empty());
    assert_eq!(harness.next_notice().message, "Image Not saved");
}

#[tokio::test]
async fn test_capture_without_binding_is_rejected() {
    let mut harness = create_harness(StaticPermissionProvider::denying_all());

    let result = harness.coordinator.take_photo();

    assert!(matches!(
        result,
        Err(DemocamError::Camera(CameraError::NotBound))
    ));
    assert_eq!(harness.next_notice().message, "Camera not ready");
}

#[tokio::test]
async fn test_preview_update_reattaches_and_rotates() {
    let mut harness = bound_harness();
    harness.surface.set_rotation(1);

    assert_eq!(harness.camera.emit_preview_output(), 1);
    harness.coordinator.pump().await.unwrap();

    let snapshot = harness.surface.snapshot();
    assert_eq!(snapshot.reattach_count, 1);
    assert!(snapshot.output.is_some());
    assert_eq!(snapshot.transform_updates, 1);
    assert_eq!(snapshot.transform.degrees(), 90.0);
}

#[tokio::test]
async fn test_rotation_changes_update_transform() {
    let mut harness = bound_harness();

    harness
        .coordinator
        .handle_event(ScreenEvent::RotationChanged(2))
        .unwrap();
    let rotated = harness.surface.snapshot();
    assert_eq!(rotated.transform.degrees(), 180.0);
    let (x, y) = rotated.transform.map_point(320.0, 240.0);
    assert!((x - 320.0).abs() < 1e-3 && (y - 240.0).abs() < 1e-3);

    harness
        .coordinator
        .handle_event(ScreenEvent::RotationChanged(7))
        .unwrap();
    let unchanged = harness.surface.snapshot();
    assert_eq!(unchanged.transform, rotated.transform);
    assert_eq!(unchanged.transform_updates, rotated.transform_updates);
}

#[tokio::test]
async fn test_visibility_suspends_and_resumes_use_cases() {
    let mut harness = bound_harness();
    assert_eq!(harness.camera.running_count(), 1);

    harness
        .coordinator
        .handle_event(ScreenEvent::VisibilityChanged(false))
        .unwrap();
    assert_eq!(harness.camera.running_count(), 0);
    assert_eq!(harness.camera.bound_capture_count(), 1);

    harness
        .coordinator
        .handle_event(ScreenEvent::VisibilityChanged(true))
        .unwrap();
    assert_eq!(harness.camera.running_count(), 1);
}

#[tokio::test]
async fn test_taps_ignored_after_finish() {
    let mut harness = bound_harness();
    harness.coordinator.finish(ExitReason::UserRequest);

    harness
        .coordinator
        .handle_event(ScreenEvent::Tap(Control::FlashToggle))
        .unwrap();

    assert_eq!(harness.coordinator.flash_mode(), FlashMode::Off);
    harness.assert_no_notice();
}

#[tokio::test]
async fn test_run_processes_events_until_close() {
    let harness = create_harness(StaticPermissionProvider::granting_all());
    let Harness {
        mut coordinator,
        camera,
        mut notices,
        ..
    } = harness;

    let events = coordinator.events();
    events
        .send(ScreenEvent::Tap(Control::FlashToggle))
        .unwrap();
    events.send(ScreenEvent::Close).unwrap();

    let reason = coordinator.run().await.unwrap();

    assert_eq!(reason, ExitReason::UserRequest);
    assert_eq!(reason.exit_code(), 0);
    assert_eq!(camera.bind_count(), 1);
    assert_eq!(camera.flash_history().len(), 1);
    assert_eq!(camera.bound_capture_count(), 0);
    assert_eq!(notices.try_recv().unwrap().message, "Flash Enable");
}

#[test]
fn test_builder_requires_camera() {
    let result = CaptureCoordinator::builder()
        .permissions(Arc::new(StaticPermissionProvider::granting_all()))
        .surface(Arc::new(HeadlessSurface::new(Size::new(640, 480), 0)))
        .build();

    match result {
        Err(DemocamError::System { message }) => {
            assert!(message.contains("Camera platform must be specified"))
        }
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(_) => panic!("Expected an error for a missing camera platform"),
    }
}
