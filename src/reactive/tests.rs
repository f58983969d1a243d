use proptest::prelude::*;

use super::*;
use crate::audio::mock::MockBackend;
use crate::audio::AudioReference;
use crate::error::ReactiveError;
use crate::params::AnalyserConfig;

fn reference(name: &str) -> Option<AudioReference> {
    AudioReference::new(name)
}

fn glow() -> (ReactiveGlow<MockBackend>, MockBackend) {
    let backend = MockBackend::new();
    let glow = ReactiveGlow::new(backend.clone(), AnalyserConfig::default()).unwrap();
    (glow, backend)
}

/// Bound, loaded and ready
fn ready_glow() -> (ReactiveGlow<MockBackend>, MockBackend) {
    let (mut glow, backend) = glow();
    glow.bind(reference("pad.wav"));
    assert!(backend.resolve_load(Ok(())));
    glow.pump();
    assert!(glow.is_ready());
    (glow, backend)
}

/// Ready, activated, playback confirmed
fn sampling_glow() -> (ReactiveGlow<MockBackend>, MockBackend) {
    let (mut glow, backend) = ready_glow();
    glow.activate(true);
    backend.resolve_all_plays();
    glow.pump();
    assert_eq!(glow.loop_state(), LoopState::Running);
    (glow, backend)
}

#[test]
fn test_new_rejects_bad_config() {
    let config = AnalyserConfig {
        fft_size: 48,
        ..Default::default()
    };
    assert!(ReactiveGlow::new(MockBackend::new(), config).is_err());
}

#[test]
fn test_ready_only_after_pipeline_attached() {
    let (mut glow, backend) = glow();
    glow.bind(reference("pad.wav"));

    assert_eq!(glow.phase(), BindPhase::Loading);
    assert!(!glow.on_frame().ready);
    assert_eq!(backend.live_playbacks(), 0);

    backend.resolve_load(Ok(()));
    let snapshot = glow.on_frame();

    assert!(snapshot.ready);
    assert_eq!(backend.live_contexts(), 1);
    assert_eq!(backend.live_playbacks(), 1);
    assert_eq!(backend.live_analysers(), 1);
    // Handles are created paused
    assert!(!backend.is_playing());
}

#[test]
fn test_scenario_silence_gives_zero_intensity() {
    let (mut glow, backend) = sampling_glow();
    backend.set_spectrum(vec![0; 32]);

    let snapshot = glow.on_frame();

    assert!(snapshot.sampling);
    assert_eq!(snapshot.intensity, 0.0);
    assert_eq!(glow.updates(), 1);
}

#[test]
fn test_scenario_full_scale_gives_unit_intensity() {
    let (mut glow, backend) = sampling_glow();
    backend.set_spectrum(vec![255; 32]);

    assert_eq!(glow.on_frame().intensity, 1.0);
}

#[test]
fn test_one_sample_per_frame() {
    let (mut glow, backend) = sampling_glow();
    backend.set_spectrum(vec![51; 32]);

    for frame in 1..=5 {
        let snapshot = glow.on_frame();
        assert!((snapshot.intensity - 0.2).abs() < 1e-6);
        assert_eq!(glow.updates(), frame);
    }
}

#[test]
fn test_scenario_deactivate_before_playback_confirms() {
    let (mut glow, backend) = ready_glow();
    backend.set_spectrum(vec![255; 32]);

    glow.activate(true);
    glow.activate(false);
    backend.resolve_all_plays();
    let snapshot = glow.on_frame();

    assert_eq!(glow.loop_state(), LoopState::Idle);
    assert_eq!(snapshot.intensity, 0.0);
    assert_eq!(glow.updates(), 0);
    assert!(!backend.is_playing());
    // Stale start is not a reportable failure
    assert!(glow.last_error().is_none());
}

#[test]
fn test_scenario_no_reference() {
    let (mut glow, backend) = glow();
    glow.bind(None);
    glow.activate(true);

    for _ in 0..3 {
        let snapshot = glow.on_frame();
        assert!(!snapshot.ready);
        assert_eq!(snapshot.intensity, 0.0);
    }
    assert_eq!(backend.loads_issued(), 0);
    assert_eq!(backend.plays_issued(), 0);
    assert!(backend.is_idle());
}

#[test]
fn test_deactivate_stops_within_a_frame() {
    let (mut glow, backend) = sampling_glow();
    backend.set_spectrum(vec![200; 32]);
    assert!(glow.on_frame().intensity > 0.0);
    let published = glow.updates();

    glow.activate(false);

    // Synchronous from the caller's view
    assert_eq!(glow.intensity(), 0.0);
    assert!(!backend.is_playing());
    assert_eq!(backend.rewinds(), 1);
    for _ in 0..3 {
        assert_eq!(glow.on_frame().intensity, 0.0);
    }
    assert_eq!(glow.updates(), published);
}

#[test]
fn test_teardown_stops_updates_and_releases() {
    let (mut glow, backend) = sampling_glow();
    backend.set_spectrum(vec![200; 32]);
    glow.on_frame();
    let published = glow.updates();

    glow.teardown();

    assert_eq!(glow.intensity(), 0.0);
    assert!(backend.is_idle());
    for _ in 0..3 {
        let snapshot = glow.on_frame();
        assert!(!snapshot.ready);
        assert!(!snapshot.sampling);
    }
    assert_eq!(glow.updates(), published);

    // Idempotent
    glow.teardown();
    assert!(backend.is_idle());
}

#[test]
fn test_bind_same_reference_is_idempotent() {
    let (mut glow, backend) = glow();
    glow.bind(reference("pad.wav"));
    glow.bind(reference("pad.wav"));
    assert_eq!(backend.loads_issued(), 1);

    backend.resolve_load(Ok(()));
    glow.pump();
    glow.bind(reference("pad.wav"));
    glow.pump();

    assert_eq!(backend.loads_issued(), 1);
    assert_eq!(backend.playbacks_opened(), 1);
    assert_eq!(backend.live_playbacks(), 1);
    assert_eq!(backend.live_analysers(), 1);

    glow.teardown();
    assert!(backend.is_idle());
}

#[test]
fn test_teardown_during_pending_bind_leaves_nothing() {
    let (mut glow, backend) = glow();
    glow.bind(reference("pad.wav"));
    glow.teardown();

    // Completion lands after teardown
    backend.resolve_load(Ok(()));
    glow.pump();

    assert!(!glow.is_ready());
    assert_eq!(backend.playbacks_opened(), 0);
    assert!(backend.is_idle());
}

#[test]
fn test_teardown_during_pending_start_wins() {
    let (mut glow, backend) = ready_glow();
    backend.set_spectrum(vec![255; 32]);

    glow.activate(true);
    assert_eq!(backend.pending_plays(), 1);
    glow.teardown();

    // Start confirmation lands after teardown
    backend.resolve_play(Ok(()));
    let snapshot = glow.on_frame();

    assert_eq!(backend.pending_plays(), 0);
    assert_eq!(glow.loop_state(), LoopState::Idle);
    assert!(!snapshot.sampling);
    assert_eq!(snapshot.intensity, 0.0);
    assert_eq!(glow.updates(), 0);
    assert!(glow.last_error().is_none());
    assert!(backend.is_idle());
}

#[test]
fn test_rebind_releases_before_acquiring() {
    let (mut glow, backend) = sampling_glow();

    glow.bind(reference("lead.wav"));

    assert!(backend.is_idle());
    assert_eq!(glow.phase(), BindPhase::Loading);
    assert_eq!(glow.loop_state(), LoopState::Idle);
    assert_eq!(glow.intensity(), 0.0);

    backend.resolve_load(Ok(()));
    glow.pump();
    assert_eq!(backend.live_playbacks(), 1);
    assert_eq!(glow.reference(), reference("lead.wav").as_ref());
}

#[test]
fn test_stale_load_after_rebind_is_ignored() {
    let (mut glow, backend) = glow();
    glow.bind(reference("pad.wav"));
    glow.bind(reference("lead.wav"));
    assert_eq!(backend.pending_loads(), 2);

    // Old load first: discarded
    backend.resolve_load(Ok(()));
    glow.pump();
    assert!(!glow.is_ready());
    assert_eq!(backend.playbacks_opened(), 0);

    backend.resolve_load(Ok(()));
    glow.pump();
    assert!(glow.is_ready());
    assert_eq!(backend.live_playbacks(), 1);
}

#[test]
fn test_rebind_after_teardown_reacquires() {
    let (mut glow, backend) = ready_glow();
    glow.teardown();
    glow.bind(reference("pad.wav"));

    assert_eq!(backend.loads_issued(), 2);
    backend.resolve_load(Ok(()));
    glow.pump();
    assert!(glow.is_ready());
}

#[test]
fn test_activation_before_ready_is_deferred() {
    let (mut glow, backend) = glow();
    glow.bind(reference("pad.wav"));
    glow.activate(true);
    assert_eq!(backend.plays_issued(), 0);

    backend.resolve_load(Ok(()));
    glow.pump();
    assert_eq!(backend.plays_issued(), 1);

    backend.resolve_all_plays();
    assert!(glow.on_frame().sampling);
}

#[test]
fn test_load_failure_degrades_to_visual_only() {
    let (mut glow, backend) = glow();
    glow.bind(reference("missing.wav"));
    backend.resolve_load(Err(ReactiveError::unavailable("missing.wav", "not found")));
    glow.pump();

    assert_eq!(glow.phase(), BindPhase::Failed);
    assert!(matches!(
        glow.last_error(),
        Some(ReactiveError::ResourceUnavailable { .. })
    ));

    glow.activate(true);
    assert_eq!(glow.on_frame().intensity, 0.0);
    assert_eq!(backend.plays_issued(), 0);

    // Same reference stays disabled
    glow.bind(reference("missing.wav"));
    assert_eq!(backend.loads_issued(), 1);
}

#[test]
fn test_attach_failure_releases_partial_resources() {
    let (mut glow, backend) = glow();
    backend.fail_attach(true);
    glow.bind(reference("stream.wav"));
    backend.resolve_load(Ok(()));
    glow.pump();

    assert_eq!(glow.phase(), BindPhase::Failed);
    assert!(matches!(
        glow.last_error(),
        Some(ReactiveError::AttachFailure(_))
    ));
    assert!(backend.is_idle());
}

#[test]
fn test_context_failure_is_resource_unavailable() {
    let (mut glow, backend) = glow();
    backend.fail_context(true);
    glow.bind(reference("pad.wav"));
    backend.resolve_load(Ok(()));
    glow.pump();

    assert!(!glow.is_ready());
    assert!(matches!(
        glow.last_error(),
        Some(ReactiveError::ResourceUnavailable { .. })
    ));
}

#[test]
fn test_rejected_playback_can_retry() {
    let (mut glow, backend) = ready_glow();
    glow.activate(true);
    backend.resolve_play(Err(ReactiveError::PlaybackRejected(
        "autoplay blocked".to_string(),
    )));
    let snapshot = glow.on_frame();

    assert!(!snapshot.sampling);
    assert!(matches!(
        glow.last_error(),
        Some(ReactiveError::PlaybackRejected(_))
    ));

    // A later activation (e.g. after a user gesture) tries again
    glow.activate(true);
    assert_eq!(backend.plays_issued(), 2);
    backend.resolve_all_plays();
    assert!(glow.on_frame().sampling);
}

#[test]
fn test_repeated_activation_is_idempotent() {
    let (mut glow, backend) = sampling_glow();
    glow.activate(true);
    glow.activate(true);

    assert_eq!(backend.plays_issued(), 1);
    assert!(glow.on_frame().sampling);
}

#[test]
fn test_deactivate_when_never_activated_is_safe() {
    let (mut glow, backend) = glow();
    glow.activate(false);
    glow.teardown();
    glow.activate(false);
    assert!(backend.is_idle());
    assert_eq!(glow.snapshot().intensity, 0.0);
}

#[test]
fn test_context_shared_and_released_with_last_instance() {
    let backend = MockBackend::new();
    let mut first = ReactiveGlow::new(backend.clone(), AnalyserConfig::default()).unwrap();
    let mut second = ReactiveGlow::new(backend.clone(), AnalyserConfig::default()).unwrap();

    first.bind(reference("a.wav"));
    second.bind(reference("b.wav"));
    backend.resolve_load(Ok(()));
    backend.resolve_load(Ok(()));
    first.pump();
    second.pump();

    assert_eq!(backend.live_contexts(), 1);
    assert_eq!(backend.live_playbacks(), 2);

    first.teardown();
    assert_eq!(backend.live_contexts(), 1);
    drop(second);
    assert!(backend.is_idle());
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Activate(bool),
    ResolvePlays,
    Frame,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<bool>().prop_map(Step::Activate),
        Just(Step::ResolvePlays),
        Just(Step::Frame),
    ]
}

proptest! {
    #[test]
    fn prop_last_activation_wins(
        steps in proptest::collection::vec(step(), 1..40),
        last in any::<bool>(),
    ) {
        let (mut glow, backend) = ready_glow();
        backend.set_spectrum(vec![128; 32]);

        for step in steps {
            match step {
                Step::Activate(on) => glow.activate(on),
                Step::ResolvePlays => backend.resolve_all_plays(),
                Step::Frame => {
                    glow.on_frame();
                }
            }
        }
        glow.activate(last);

        // Settle
        backend.resolve_all_plays();
        glow.on_frame();
        let settled = glow.on_frame();

        // Same outcome as a fresh instance given only the last call
        let (mut reference_glow, reference_backend) = ready_glow();
        reference_backend.set_spectrum(vec![128; 32]);
        reference_glow.activate(last);
        reference_backend.resolve_all_plays();
        reference_glow.on_frame();
        let expected = reference_glow.on_frame();

        prop_assert_eq!(settled, expected);
        prop_assert_eq!(backend.is_playing(), reference_backend.is_playing());
        prop_assert!((0.0..=1.0).contains(&settled.intensity));
    }
}
