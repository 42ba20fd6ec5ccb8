use approx::assert_relative_eq;
use muchfun_core::{
    AudioSettings, BlendMode, DeviceCommand, Intensity, IntensityMixer, LevelCell, MixerConfig,
    PatternGenerator, PatternKind, PatternSettings,
};
use proptest::prelude::*;
use std::sync::Arc;

const TICK: f32 = 0.02;

fn seeded_mixer(config: MixerConfig, cell: Arc<LevelCell>, seed: u64) -> IntensityMixer {
    let pattern = PatternGenerator::with_seed(config.pattern, seed);
    IntensityMixer::with_pattern(config, cell, pattern)
}

fn run_ticks(mixer: &mut IntensityMixer, count: usize, connected: bool) -> Vec<f32> {
    (0..count)
        .map(|_| mixer.tick(TICK, connected).levels.output.value())
        .collect()
}

proptest! {
    #[test]
    fn output_is_always_clamped(
        manual in proptest::num::f32::ANY,
        rms in proptest::num::f32::ANY,
        sensitivity in -5.0f32..50.0,
        max_intensity in -2.0f32..4.0,
        randomness in 0.0f32..1.0,
        mode in 0usize..3,
        kind in 0usize..6,
        dt in 0.0f32..2.0,
    ) {
        let cell = LevelCell::new();
        let config = MixerConfig {
            blend_mode: BlendMode::ALL[mode],
            audio: AudioSettings { sensitivity, ..AudioSettings::default() },
            pattern: PatternSettings {
                kind: PatternKind::ALL[kind],
                max_intensity,
                speed: 3.0,
                randomness,
            },
            ..MixerConfig::default()
        };
        let mut mixer = seeded_mixer(config, Arc::clone(&cell), 7);
        mixer.set_manual(manual);
        mixer.set_audio_enabled(true);
        mixer.set_pattern_enabled(true);

        for _ in 0..20 {
            cell.store(rms);
            let out = mixer.tick(dt, true);
            prop_assert!((0.0..=1.0).contains(&out.levels.output.value()));
            if let Some(DeviceCommand::Scalar(level)) = out.command {
                prop_assert!((0.0..=1.0).contains(&level.value()));
            }
        }
    }
}

#[test]
fn test_emergency_stop_forces_zero_until_rearmed() {
    let cell = LevelCell::new();
    let mut mixer = seeded_mixer(MixerConfig::default(), Arc::clone(&cell), 1);
    mixer.set_manual(0.7);
    mixer.set_audio_enabled(true);
    mixer.set_pattern_enabled(true);
    cell.store(0.5);
    run_ticks(&mut mixer, 10, true);
    assert!(mixer.levels().output.value() > 0.0);

    assert_eq!(mixer.emergency_stop(), DeviceCommand::Stop);

    // Sources keep producing, the latch wins
    for _ in 0..50 {
        cell.store(0.9);
        mixer.set_manual(0.8);
        let out = mixer.tick(TICK, true);
        assert_eq!(out.levels.output, Intensity::ZERO);
        assert_eq!(out.command, None);
    }
    assert!(!mixer.set_audio_enabled(true));
    assert!(!mixer.set_pattern_enabled(true));
    assert!(!mixer.audio_enabled());
    assert!(!mixer.pattern_enabled());

    mixer.rearm();
    assert!(!mixer.is_stopped());
    // Nothing comes back on its own
    assert_eq!(mixer.tick(TICK, true).levels.output, Intensity::ZERO);

    mixer.set_manual(0.3);
    mixer.tick(0.5, true);
    assert_relative_eq!(mixer.levels().output.value(), 0.3);
}

#[test]
fn test_audio_converges_proportionally() {
    let config = MixerConfig {
        audio: AudioSettings {
            sensitivity: 1.0,
            ..AudioSettings::default()
        },
        ..MixerConfig::default()
    };

    let settle = |amplitude: f32| {
        let cell = LevelCell::new();
        let mut mixer = seeded_mixer(config.clone(), Arc::clone(&cell), 2);
        mixer.set_audio_enabled(true);
        // Constant-amplitude square wave: RMS equals the amplitude
        let buffer: Vec<f32> = (0..512)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect();
        let mut last = 0.0;
        for _ in 0..300 {
            cell.store(muchfun_core::rms(&buffer));
            last = mixer.tick(TICK, true).levels.audio.value();
        }
        // Stable: further ticks do not move it
        let next = mixer.tick(TICK, true).levels.audio.value();
        assert_relative_eq!(last, next, epsilon = 1e-5);
        last
    };

    let low = settle(0.02);
    let high = settle(0.04);
    assert_relative_eq!(low, 0.02 * 5.0, epsilon = 1e-4);
    assert_relative_eq!(high, 2.0 * low, epsilon = 1e-4);
}

#[test]
fn test_pattern_without_randomness_is_deterministic_and_periodic() {
    let settings = PatternSettings {
        kind: PatternKind::Heartbeat,
        max_intensity: 0.9,
        speed: 2.0,
        randomness: 0.0,
    };
    let config = MixerConfig {
        pattern: settings,
        ..MixerConfig::default()
    };

    let mut a = seeded_mixer(config.clone(), LevelCell::new(), 11);
    let mut b = seeded_mixer(config, LevelCell::new(), 99);
    a.set_pattern_enabled(true);
    b.set_pattern_enabled(true);
    assert_eq!(run_ticks(&mut a, 200, true), run_ticks(&mut b, 200, true));

    for kind in PatternKind::ALL {
        let gen = PatternGenerator::with_seed(
            PatternSettings {
                kind,
                ..settings
            },
            5,
        );
        let cycle = kind.period() / settings.speed;
        for i in 0..50 {
            let t = (i + 1) as f32 * 0.113;
            assert_relative_eq!(gen.value_at(t), gen.value_at(t + cycle), epsilon = 1e-3);
        }
    }
}

#[test]
fn test_disconnect_turns_ticks_into_noops() {
    let cell = LevelCell::new();
    let mut mixer = seeded_mixer(MixerConfig::default(), cell, 3);
    mixer.set_manual(0.5);
    assert!(mixer.tick(TICK, true).command.is_some());

    for i in 0..100 {
        mixer.set_manual(i as f32 / 100.0);
        assert_eq!(mixer.tick(0.3, false).command, None);
    }
    assert_eq!(mixer.last_sent(), None);

    // Reconnecting sends the current value straight away
    mixer.set_manual(0.25);
    assert_eq!(
        mixer.tick(TICK, true).command,
        Some(DeviceCommand::Scalar(Intensity::new(0.25)))
    );
}

#[test]
fn test_drop_to_zero_is_always_sent() {
    let mut mixer = seeded_mixer(MixerConfig::default(), LevelCell::new(), 4);
    mixer.set_change_threshold(0.5);
    mixer.set_manual(0.1);
    mixer.tick(TICK, true);
    mixer.set_manual(0.0);
    assert_eq!(
        mixer.tick(1.0, true).command,
        Some(DeviceCommand::Scalar(Intensity::ZERO))
    );
}
