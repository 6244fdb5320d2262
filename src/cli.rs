use crate::agent::parse_lenient;
use crate::config::load_config;
use crate::render::{write_output_png, write_output_svg, Scene};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "svgscene", version, about = "Render a JSON shape list to SVG or PNG")]
pub struct Args {
    /// Input file (JSON shape list) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (canvas defaults, PNG dimensions)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<u32>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<u32>,

    /// Canvas background color token ("none" for transparent)
    #[arg(short = 'b', long = "background")]
    pub background: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.canvas.width = width;
    }
    if let Some(height) = args.height {
        config.canvas.height = height;
    }
    if let Some(background) = args.background {
        config.canvas.background = background;
    }

    let input = read_input(args.input.as_deref())?;
    let value = parse_lenient(&input)?;
    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        object @ serde_json::Value::Object(_) => vec![object],
        _ => return Err(anyhow::anyhow!("input must be a shape object or an array of shapes")),
    };

    let mut scene = Scene::new(
        config.canvas.width,
        config.canvas.height,
        config.canvas.background.clone(),
    );
    let accepted = scene.add_shapes(&entries);
    if accepted < entries.len() {
        eprintln!("warning: accepted {accepted} of {} shapes", entries.len());
    }

    let svg = scene.render_svg();
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output)?;
            write_output_png(
                &svg,
                &output,
                config.render.png_width.unwrap_or(config.canvas.width),
                config.render.png_height.unwrap_or(config.canvas.height),
            )?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for png output"))
}
