//! binary specimen tool
//!
//! Builds sample SVG images for a font and some text, either by copying the
//! glyph artwork out of the font's SVG table or by recoloring an `hb-view`
//! rendering.

use std::path::PathBuf;

use clap::Parser;
use specimen::{build_entry, AspectRatio, Entry, Error, HbShape, HbView, Manifest, OutputFormat};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The hb-shape binary
    #[arg(long, env = "HB_SHAPE", default_value = "hb-shape", global = true)]
    hb_shape: PathBuf,

    /// The hb-view binary
    #[arg(long, env = "HB_VIEW", default_value = "hb-view", global = true)]
    hb_view: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Assemble glyphs from the font's SVG table
    Assemble {
        /// The input font file.
        #[arg(short, long)]
        font: PathBuf,
        /// Text to shape
        #[arg(short, long)]
        text: String,
        /// The output SVG file
        #[arg(short, long)]
        output: PathBuf,
        /// Widen the canvas to this width:height ratio, e.g. 16:9 or 1.5
        #[arg(long)]
        aspect_ratio: Option<AspectRatio>,
        /// Ask hb-shape for JSON output
        #[arg(long)]
        json: bool,
    },
    /// Recolor the hb-view rendering of a monochrome font
    Colorize {
        /// The input font file.
        #[arg(short, long)]
        font: PathBuf,
        /// Text to render
        #[arg(short, long)]
        text: String,
        /// The output SVG file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build every specimen listed in a JSON manifest
    Batch {
        /// The manifest file
        manifest: PathBuf,
        /// Resolve relative font paths against this directory instead of the manifest's
        #[arg(long)]
        font_root: Option<PathBuf>,
        /// Ask hb-shape for JSON output
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Error> {
    let view = HbView::new(&args.hb_view);
    match args.command {
        Command::Assemble {
            font,
            text,
            output,
            aspect_ratio,
            json,
        } => {
            let shaper = HbShape::new(&args.hb_shape, output_format(json));
            let entry = Entry::Assemble {
                font,
                text,
                output,
                aspect_ratio: aspect_ratio.map(AspectRatio::get),
            };
            build_entry(&entry, &shaper, &view)
        }
        Command::Colorize { font, text, output } => {
            let shaper = HbShape::new(&args.hb_shape, OutputFormat::Text);
            build_entry(&Entry::Colorize { font, text, output }, &shaper, &view)
        }
        Command::Batch {
            manifest,
            font_root,
            json,
        } => {
            let shaper = HbShape::new(&args.hb_shape, output_format(json));
            let manifest = Manifest::load(&manifest, font_root.as_deref())?;
            for entry in &manifest.entries {
                build_entry(entry, &shaper, &view)?;
            }
            Ok(())
        }
    }
}

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}
