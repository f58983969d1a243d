//! Procedural music synthesis for `synth:` references.

use glicol::Engine;

use crate::error::ReactiveError;

/// Samples per Glicol block
/// 128 = 2.9ms @ 44.1kHz
pub const BLOCK_SIZE: usize = 128;

/// Glicol composition (procedural music code)
pub const DEFAULT_COMPOSITION: &str = r#"
~gate: speed 2.0 >> seq 60 _60 _~a 48
~a: choose 48 48 48 72 0 0 0
~amp: ~gate >> envperc 0.001 0.1
~pit: ~gate >> mul 261.63
~lead: saw ~pit >> mul ~amp >> lpf ~mod 5.0 >> mul 0.1
~mod: sin 0.2 >> mul 1300 >> add 1500
o: ~lead >> plate 0.1
"#;

/// Look up a built-in composition by name
pub fn composition(name: &str) -> Option<&'static str> {
    match name {
        "" | "default" => Some(DEFAULT_COMPOSITION),
        _ => None,
    }
}

/// Glicol engine rendered block by block
pub struct SynthVoice {
    code: &'static str,
    sample_rate_hz: u32,
    engine: Engine<BLOCK_SIZE>,
    left: [f32; BLOCK_SIZE],
    right: [f32; BLOCK_SIZE],
    cursor: usize,
}

impl SynthVoice {
    pub fn new(code: &'static str, sample_rate_hz: u32) -> Result<Self, ReactiveError> {
        Ok(Self {
            code,
            sample_rate_hz,
            engine: build_engine(code, sample_rate_hz)?,
            left: [0.0; BLOCK_SIZE],
            right: [0.0; BLOCK_SIZE],
            cursor: BLOCK_SIZE,
        })
    }

    pub fn next_frame(&mut self) -> [f32; 2] {
        if self.cursor == BLOCK_SIZE {
            let (buffers, _) = self.engine.next_block(vec![]);
            for i in 0..BLOCK_SIZE {
                // Safety limiter: hard clip to ±0.5 to prevent ear damage
                self.left[i] = buffers[0][i].clamp(-0.5, 0.5);
                self.right[i] = buffers[1][i].clamp(-0.5, 0.5);
            }
            self.cursor = 0;
        }

        let frame = [self.left[self.cursor], self.right[self.cursor]];
        self.cursor += 1;
        frame
    }

    /// Restart the composition from its first beat
    pub fn rewind(&mut self) {
        match build_engine(self.code, self.sample_rate_hz) {
            Ok(engine) => {
                self.engine = engine;
                self.cursor = BLOCK_SIZE;
            }
            Err(e) => tracing::warn!("synth rewind failed, continuing: {}", e),
        }
    }
}

fn build_engine(code: &str, sample_rate_hz: u32) -> Result<Engine<BLOCK_SIZE>, ReactiveError> {
    let mut engine = Engine::<BLOCK_SIZE>::new();
    engine.set_sr(sample_rate_hz as usize);
    engine.update_with_code(code);
    engine.update().map_err(|e| {
        ReactiveError::unavailable("synth", format!("Glicol engine init failed: {:?}", e))
    })?;
    Ok(engine)
}
