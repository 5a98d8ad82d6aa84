use std::path::PathBuf;

use clap::{Parser, Subcommand};

use p3dpack::cca;
use p3dpack::error::Error;
use p3dpack::import::import_p3d;

/// Inspect Crashday P3D models and CCA anchor sidecars
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of a .p3d model file
    Info {
        /// The .p3d file to inspect
        file: PathBuf,

        /// Directories to resolve texture images against
        #[clap(short, long)]
        texture_path: Vec<PathBuf>,

        /// Dump the whole document as JSON instead of a summary
        #[clap(long)]
        json: bool,
    },
    /// Print the anchors stored in a .cca sidecar
    Anchors {
        /// The .cca file to inspect
        file: PathBuf,
    },
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    match args.command {
        Command::Info {
            file,
            texture_path,
            json,
        } => {
            let data = std::fs::read(&file)?;
            let imported = import_p3d(&data, &texture_path)?;
            let doc = &imported.document;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(doc).expect("document serializes")
                );
                return Ok(());
            }

            println!(
                "{}: {} meshes, {} lights, {} textures",
                file.display(),
                doc.num_meshes(),
                doc.num_lights(),
                doc.num_textures()
            );
            println!(
                "size: {} x {} x {} (length x depth x height)",
                doc.length, doc.depth, doc.height
            );
            for mesh in &doc.meshes {
                println!(
                    "mesh  {:24} {:6} vertices {:6} polys  flags {:#06b}",
                    mesh.name,
                    mesh.vertices.len(),
                    mesh.polys.len(),
                    mesh.flags
                );
            }
            for light in &doc.lights {
                println!(
                    "light {:24} range {:8} color #{:06X}",
                    light.name, light.range, light.color
                );
            }
            for binding in &imported.textures {
                match &binding.path {
                    Some(path) => println!("texture {} -> {}", binding.name, path.display()),
                    None => println!("texture {} (not found)", binding.name),
                }
            }
        }
        Command::Anchors { file } => {
            let text = std::fs::read_to_string(&file)?;
            let set = cca::read_anchor_set(&text);

            if !set.mesh_names.is_empty() {
                println!("meshes: {}", set.mesh_names.join(" "));
            }
            for (name, pos) in cca::VECTOR_ANCHORS.iter().zip(set.positions.iter()) {
                match pos {
                    Some([x, y, z]) => println!("{name:24} {x} {y} {z}"),
                    None => println!("{name:24} (absent)"),
                }
            }
            match set.engine_y {
                Some(y) => println!("{:24} y = {y}", cca::ENGINE_ANCHOR),
                None => println!("{:24} (absent)", cca::ENGINE_ANCHOR),
            }
        }
    }

    Ok(())
}
