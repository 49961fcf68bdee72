use regtypes::jvm::class_graph::{ClassGraph, ClassGraphArenas, ClassLoaderId};
use regtypes::jvm::verifier::{CacheSettings, RegType, RegTypeArenas, RegTypeCache};
use regtypes::runtime::{BoxedType, IntrinsicPatch, PatchTable};

use clap::{crate_version, Arg, ArgAction, Command};
use std::fs::File;
use std::io::{self, BufWriter, Write};

fn main() -> io::Result<()> {
    env_logger::init();

    let matches = command().get_matches();

    let settings = CacheSettings {
        can_load_classes: !matches.get_flag("no-load"),
        ..CacheSettings::default()
    };

    let class_graph_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_graph_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, settings);

    let mut reg_types = vec![];
    for argument in matches.get_many::<String>("TYPES").into_iter().flatten() {
        let reg_type = resolve_argument(&cache, boot, argument);
        println!("{}: {}", argument, reg_type);
        reg_types.push(reg_type);
    }

    if matches.get_flag("merge") {
        if let Some((first, rest)) = reg_types.split_first() {
            log::info!("Merging {} types", reg_types.len());
            let merged = rest
                .iter()
                .copied()
                .fold(*first, |merged, reg_type| merged.safe_merge(reg_type, &cache));
            println!("merged: {}", merged);
        }
    }

    if let Some(patches_file) = matches.get_one::<String>("patches") {
        let mut table = PatchTable::new();
        for reg_type in &reg_types {
            if let Some(value) = reg_type.constant_value() {
                match IntrinsicPatch::value_of_object(BoxedType::Integer, value) {
                    Some(patch) => {
                        table.push(patch);
                    }
                    None => log::warn!("Integer {} is not in the boxed cache", value),
                }
            }
        }
        log::info!("Writing {} patches to '{}'", table.len(), patches_file);
        let mut writer = BufWriter::new(File::create(patches_file)?);
        table.serialize(&mut writer)?;
        writer.flush()?;
    }

    if matches.get_flag("dump") {
        print!("{}", cache);
    }

    Ok(())
}

/// Integers become precise constants, everything else is read as a type descriptor
fn resolve_argument<'r, 'g>(
    cache: &RegTypeCache<'r, 'g>,
    loader: ClassLoaderId<'g>,
    argument: &str,
) -> &'r RegType<'r, 'g> {
    match argument.parse::<i32>() {
        Ok(value) => cache.from_cat1_const(value, true),
        Err(_) => cache.from_descriptor(loader, argument, false),
    }
}

fn command() -> Command {
    Command::new("Register type inspector")
        .version(crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Resolve descriptors and constants into the register types a verifier tracks")
        .arg(
            Arg::new("merge")
                .long("merge")
                .action(ArgAction::SetTrue)
                .help("Merge all of the types, from left to right"),
        )
        .arg(
            Arg::new("no-load")
                .long("no-load")
                .action(ArgAction::SetTrue)
                .help("Don't load classes (only classes that are already resolved are used)"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .action(ArgAction::SetTrue)
                .help("Print every entry of the type cache at the end"),
        )
        .arg(
            Arg::new("patches")
                .long("patches")
                .value_name("FILE")
                .required(false)
                .help("Write `Integer.valueOf` patches for the constant arguments to this file"),
        )
        .arg(
            Arg::new("TYPES")
                .help("Type descriptors (eg. `[Ljava/lang/String;`) or integer constants")
                .required(true)
                .num_args(1..)
                .allow_negative_numbers(true)
                .index(1),
        )
}
