// anim-replay/src/main.rs
// Replays a CSV of recorded sim inputs through the animation pipeline and
// writes every published cell per frame, so the curves can be plotted
// without a running simulator.

use anyhow::{Context, Result};
use clap::Parser;
use dataref_schema::{AnimState, SimInputs, SimWrites, CELLS};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CLI args
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "anim-replay", about = "Replay sim inputs through the Hughes 500D animations")]
struct Args {
    /// CSV of per-frame inputs, one row per flight-loop tick
    #[arg(short, long)]
    input: PathBuf,

    /// CSV of published cells, one row per frame
    #[arg(short, long)]
    output: PathBuf,

    /// JSON `AnimState` to start from instead of all zeros
    #[arg(long)]
    initial: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One CSV input row. Columns may be omitted; missing values read as zero,
/// matching a dataref the sim does not publish.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrameRow {
    frame_period_s: f32,
    door_request: f32,
    tacrad_0: f32,
    tacrad_1: f32,
    tacrad_2: f32,
    tacrad_3: f32,
    tacrad_4: f32,
    tacrad_5: f32,
    tacrad_6: f32,
    tacrad_7: f32,
    cyclic_elev_disc_tilt: f32,
    cyclic_ailn_disc_tilt: f32,
    acf_cyclic_elev: f32,
    acf_cyclic_ailn: f32,
    yoke_pitch_ratio: f32,
    yoke_roll_ratio: f32,
    collective_pitch_deg: f32,
    num_blades: f32,
    /// `onground_any` as recorded: nonzero means on the ground
    on_ground: i32,
    roll_deg: f32,
    heading_deg: f32,
    local_x: f32,
    local_z: f32,
    view_x: f32,
    view_z: f32,
    audio_selector: i32,
    p_dot: f32,
    q_dot: f32,
}

impl From<FrameRow> for SimInputs {
    fn from(r: FrameRow) -> Self {
        SimInputs {
            frame_period_s: r.frame_period_s,
            door_request: r.door_request,
            tacrad: [
                r.tacrad_0, r.tacrad_1, r.tacrad_2, r.tacrad_3,
                r.tacrad_4, r.tacrad_5, r.tacrad_6, r.tacrad_7,
            ],
            cyclic_elev_disc_tilt: r.cyclic_elev_disc_tilt,
            cyclic_ailn_disc_tilt: r.cyclic_ailn_disc_tilt,
            acf_cyclic_elev: r.acf_cyclic_elev,
            acf_cyclic_ailn: r.acf_cyclic_ailn,
            yoke_pitch_ratio: r.yoke_pitch_ratio,
            yoke_roll_ratio: r.yoke_roll_ratio,
            collective_pitch_deg: r.collective_pitch_deg,
            num_blades: r.num_blades,
            on_ground: r.on_ground != 0,
            roll_deg: r.roll_deg,
            heading_deg: r.heading_deg,
            local_x: r.local_x,
            local_z: r.local_z,
            view_x: r.view_x,
            view_z: r.view_z,
            audio_selector: r.audio_selector,
            p_dot: r.p_dot,
            q_dot: r.q_dot,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();

    let state = match &args.initial {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid AnimState JSON in {}", path.display()))?
        }
        None => AnimState::default(),
    };

    let input = std::fs::File::open(&args.input)
        .with_context(|| format!("Cannot open {}", args.input.display()))?;
    let output = std::fs::File::create(&args.output)
        .with_context(|| format!("Cannot create {}", args.output.display()))?;

    eprintln!("Replaying {}...", args.input.display());
    let frames = replay(input, output, state)?;
    eprintln!("Done. {frames} frames written to {}", args.output.display());

    Ok(())
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Run every input row through the pipeline. Returns the number of frames.
pub fn replay<R: Read, W: Write>(input: R, output: W, mut state: AnimState) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(header())?;

    let mut frames = 0;
    for (i, row) in reader.deserialize::<FrameRow>().enumerate() {
        // +2: header line, 1-based
        let row = row.with_context(|| format!("Bad input row at line {}", i + 2))?;
        let inputs = SimInputs::from(row);
        let writes = anim_core::run_frame(&mut state, &inputs);
        writer.write_record(record(i, &state, &writes))?;
        frames += 1;
    }

    writer.flush().context("Failed to flush output")?;
    Ok(frames)
}

fn header() -> Vec<String> {
    let mut cols = vec!["frame".to_string()];
    cols.extend(CELLS.iter().map(|c| c.path.to_string()));
    cols.extend(
        ["door_bounce", "cyclic_elev_disc_tilt", "cyclic_ailn_disc_tilt", "p_dot", "q_dot"]
            .map(String::from),
    );
    cols
}

fn record(frame: usize, state: &AnimState, writes: &SimWrites) -> Vec<String> {
    let mut cols = vec![frame.to_string()];
    cols.extend((0..CELLS.len()).map(|i| state.cell(i).to_string()));
    cols.push(u8::from(state.door_bounce).to_string());
    cols.extend(
        [
            writes.cyclic_elev_disc_tilt,
            writes.cyclic_ailn_disc_tilt,
            writes.p_dot,
            writes.q_dot,
        ]
        .map(|v| v.to_string()),
    );
    cols
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
