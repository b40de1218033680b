use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use gvenc::{Coordinator, EncodeJob, JobState, Quality, VideoFormat};

#[derive(Parser, Debug)]
#[command(name = "gvenc", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode directories of images into GV files.
    Encode(EncodeArgs),
    /// Print the header and address-table summary of a GV file.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Input directories; each becomes `<dir>.gv`.
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Frame rate stored in the output header.
    #[arg(long, default_value_t = 30.0)]
    fps: f32,

    /// Fast range-fit quantization instead of iterative cluster fit.
    #[arg(long)]
    lite: bool,

    /// Inputs carry an alpha channel: encode DXT5 instead of DXT1.
    #[arg(long)]
    alpha: bool,

    /// Output path override (single input directory only).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// GV file to inspect.
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Encode(args) => cmd_encode(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    if args.out.is_some() && args.dirs.len() != 1 {
        anyhow::bail!("--out requires exactly one input directory");
    }

    let fps = args.fps.clamp(1.0, 3000.0);
    let quality = if args.lite { Quality::Lite } else { Quality::Full };
    let format = VideoFormat::from_alpha(args.alpha);

    let mut coord = Coordinator::new();
    for dir in &args.dirs {
        let mut job = EncodeJob::from_dir(dir, fps, quality, format)
            .with_context(|| format!("scan input directory '{}'", dir.display()))?;
        if let Some(out) = &args.out {
            job.output_path = out.clone();
        }
        if job.image_paths.is_empty() {
            eprintln!("{}: no input images, skipping", dir.display());
        }
        coord.submit(job);
    }

    while coord.poll() {
        for status in coord.statuses() {
            if matches!(status.state, JobState::Running) {
                eprint!(
                    "{}: {}/{} frames, {:.1}s elapsed",
                    status.output_path.display(),
                    status.done_frames,
                    status.total_frames,
                    status.elapsed_seconds,
                );
                let done = status.done_frames;
                if done > 0 && status.elapsed_seconds > 0.0 {
                    let rate = done as f32 / status.elapsed_seconds;
                    let left = status.total_frames.saturating_sub(done) as f32 / rate;
                    eprint!(", ~{left:.1}s left");
                }
                eprintln!();
            }
        }
        std::thread::sleep(Duration::from_millis(500));
    }

    let mut failures = 0usize;
    for status in coord.statuses() {
        match &status.state {
            JobState::Done => {
                if status.total_frames > 0 {
                    eprintln!(
                        "wrote {} ({} frames, {:.2}s)",
                        status.output_path.display(),
                        status.total_frames,
                        status.elapsed_seconds,
                    );
                }
            }
            JobState::Failed(e) => {
                failures += 1;
                eprintln!("failed {}: {e}", status.output_path.display());
            }
            JobState::Cancelled => {
                eprintln!("cancelled {}", status.output_path.display());
            }
            JobState::Queued | JobState::Running => {}
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} job(s) failed");
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let mut file = std::fs::File::open(&args.file)
        .with_context(|| format!("open '{}'", args.file.display()))?;

    let header = gvenc::GvHeader::read_from(&mut file)?;
    let entries = gvenc::read_address_table(&mut file, header.frame_count)?;
    let payload_bytes: u64 = entries.iter().map(|e| e.size).sum();

    println!(
        "{}x{} {:?}, {} frames @ {} fps",
        header.width, header.height, header.format, header.frame_count, header.fps
    );
    println!(
        "block size {} bytes, payload {} bytes ({:.2}x over DXT)",
        header.block_size,
        payload_bytes,
        u64::from(header.block_size) as f64 * f64::from(header.frame_count)
            / payload_bytes.max(1) as f64,
    );
    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        println!(
            "payload region [{:#x}, {:#x}), address table at {:#x}",
            first.offset,
            last.offset + last.size,
            last.offset + last.size,
        );
    }
    Ok(())
}
