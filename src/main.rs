//! Vibeglow - audio-reactive glow for a hovered element
//!
//! Simulates a pointer entering and leaving an element on a fixed schedule,
//! drives the reactive engine once per frame and prints the resulting glow.

use std::thread;
use std::time::Instant;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use vibeglow::audio::{AudioBackend, OfflineBackend};
use vibeglow::cli::Args;
use vibeglow::params::GlowMapping;
use vibeglow::reactive::ReactiveGlow;

/// Print one status line every this many frames
const REPORT_EVERY_FRAMES: usize = 6;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = args.frame_config().validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    run_selected(&args);
}

#[cfg(feature = "device")]
fn run_selected(args: &Args) {
    if args.offline {
        run(OfflineBackend::new(args.offline_config()), args);
    } else {
        run(vibeglow::audio::DeviceBackend::new(), args);
    }
}

#[cfg(not(feature = "device"))]
fn run_selected(args: &Args) {
    if !args.offline {
        tracing::info!("Built without the `device` feature, analysing offline");
    }
    run(OfflineBackend::new(args.offline_config()), args);
}

/// Frame loop: pointer schedule in, glow style out
fn run<B: AudioBackend>(backend: B, args: &Args) {
    let mut glow = match ReactiveGlow::new(backend, args.analyser_config()) {
        Ok(glow) => glow,
        Err(e) => {
            error!("Invalid analyser settings: {}", e);
            std::process::exit(2);
        }
    };
    let mapping = GlowMapping::default();
    let frames = args.frame_config();

    println!("Vibeglow - audio-reactive hover glow");
    match args.audio_reference() {
        Some(reference) => println!("Source: {}", reference),
        None => println!("Source: none (visual only)"),
    }

    glow.bind(args.audio_reference());

    let start = Instant::now();
    for frame in 0..args.total_frames() {
        let time_s = frame as f32 / frames.fps as f32;
        glow.activate(args.hovered_at(time_s));

        let snapshot = glow.on_frame();

        if frame % REPORT_EVERY_FRAMES == 0 {
            let style = mapping
                .style(&snapshot)
                .map(|style| style.box_shadow(args.color))
                .unwrap_or_else(|| "none".to_string());
            println!(
                "{:6.2}s ready={:<5} active={:<5} intensity={:.3} {:<24} box-shadow: {}",
                time_s,
                snapshot.ready,
                snapshot.active,
                snapshot.intensity,
                meter(snapshot.intensity),
                style
            );
        }

        // Hold the frame cadence
        let next = start + frames.frame_interval() * (frame as u32 + 1);
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    glow.teardown();
}

/// Text bar for an intensity in [0, 1]
fn meter(intensity: f32) -> String {
    let filled = (intensity.clamp(0.0, 1.0) * 20.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(20 - filled))
}
