use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use xr_uniforms::layout::field_offsets;
use xr_uniforms::{shader_header, FrameDescription, FramePacket, LayoutVariant};

const USAGE: &str =
    "Usage: xr-uniforms header [variant...] | layout | pack <frame.xml> [--out <dir>]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match CliOptions::parse(env::args().skip(1))? {
        CliOptions::Header { variants } => {
            let variants = if variants.is_empty() {
                LayoutVariant::ALL.to_vec()
            } else {
                variants
            };
            print!("{}", shader_header(&variants));
            Ok(())
        }
        CliOptions::Layout => {
            print_layouts();
            Ok(())
        }
        CliOptions::Pack { path, out } => pack(&path, out),
    }
}

fn print_layouts() {
    for variant in LayoutVariant::ALL {
        println!(
            "{} ({}) size={} align={} binding={:?}",
            variant.shader_name(),
            variant,
            variant.size(),
            variant.alignment(),
            variant.binding()
        );
        for (field, offset) in field_offsets(variant.fields()) {
            let array = if field.count > 1 {
                format!("[{}]", field.count)
            } else {
                String::new()
            };
            println!(
                "  {offset:>4}  {}{array} {}",
                field.kind.msl_type(),
                field.name
            );
        }
    }
}

fn pack(path: &Path, out: Option<PathBuf>) -> Result<()> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("failed to read frame description {}", path.display()))?;
    let description =
        FrameDescription::from_xml(&xml).context("failed to parse frame description")?;
    let packet = FramePacket::build(&description)?;

    println!(
        "Packed frame with {} view(s) and {} light(s)",
        packet.views.count(),
        packet.lights.len()
    );
    for (variant, bytes) in packet.blocks() {
        println!(" - {variant}: {} bytes", bytes.len());
    }
    for (index, light) in packet.lights.iter().enumerate() {
        let position = light.position_in_view(0);
        println!(
            " - light {index} in view 0 at ({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        );
    }

    if let Some(dir) = out {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        for (variant, bytes) in packet.blocks() {
            let file = dir.join(format!("{variant}.bin"));
            fs::write(&file, bytes)
                .with_context(|| format!("failed to write {}", file.display()))?;
            info!("wrote {} ({} bytes)", file.display(), bytes.len());
        }
        println!("Wrote blocks to {}", dir.display());
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum CliOptions {
    Header { variants: Vec<LayoutVariant> },
    Layout,
    Pack { path: PathBuf, out: Option<PathBuf> },
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(command) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        match command.as_str() {
            "header" => {
                let variants = args
                    .map(|arg| arg.parse::<LayoutVariant>())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Header { variants })
            }
            "layout" => match args.next() {
                Some(other) => Err(anyhow!("Unknown argument: {other}. {USAGE}")),
                None => Ok(Self::Layout),
            },
            "pack" => {
                let mut path = None;
                let mut out = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--out" => {
                            let dir = args
                                .next()
                                .ok_or_else(|| anyhow!("--out expects a directory"))?;
                            out = Some(PathBuf::from(dir));
                        }
                        other if other.starts_with("--") => {
                            return Err(anyhow!("Unknown argument: {other}. Expected --out"));
                        }
                        other if path.is_none() => path = Some(PathBuf::from(other)),
                        other => return Err(anyhow!("Unexpected argument: {other}")),
                    }
                }
                let path = path.ok_or_else(|| anyhow!(USAGE))?;
                Ok(Self::Pack { path, out })
            }
            other => Err(anyhow!("Unknown command: {other}. {USAGE}")),
        }
    }
}
