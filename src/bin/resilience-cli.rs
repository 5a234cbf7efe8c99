use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;
use std::process::exit;

use rand::rngs::OsRng;
use resilience_core::config::{EncodingConfig, SSSConfig};
use resilience_core::rs;
use resilience_core::share::{Share, ShareMetadata};
use resilience_core::shard::{ReconstructionResult, Shard};
use resilience_core::sss;
use tracing::{debug, info, warn};

fn throw_error(code: i32, message: &str) -> ! {
    eprintln!("{}", message);
    exit(code);
}

fn dump_shards(shards: &[Shard], out_dir: &PathBuf) -> std::io::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    for shard in shards {
        let filename = out_dir.join(format!("shard-{:04}.bin", shard.index));
        debug!("writing shard {} to `{:?}`", shard.index, filename);
        let mut file = File::create(&filename)?;
        file.write_all(&shard.to_bytes())?;
    }
    info!("wrote {} shards to `{:?}`", shards.len(), out_dir);
    Ok(())
}

fn read_shards(paths: &[String]) -> Vec<Shard> {
    paths
        .iter()
        .map(|p| {
            let bytes = std::fs::read(p)
                .unwrap_or_else(|e| throw_error(2, &format!("could not read `{}`: {}", p, e)));
            Shard::from_bytes(&bytes)
                .unwrap_or_else(|e| throw_error(2, &format!("could not parse shard `{}`: {}", p, e)))
        })
        .collect()
}

fn dump_shares(shares: &[Share], out_dir: &PathBuf) -> std::io::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    for share in shares {
        let filename = out_dir.join(format!("share-{:03}.txt", share.x));
        debug!("writing share x={} to `{:?}`", share.x, filename);
        let mut file = File::create(&filename)?;
        writeln!(file, "{}", share.x)?;
        writeln!(file, "{}", hex::encode(&share.y))?;
        writeln!(file, "{}", share.metadata.to_encoded())?;
    }
    info!("wrote {} shares to `{:?}`", shares.len(), out_dir);
    Ok(())
}

fn read_shares(paths: &[String]) -> Vec<Share> {
    paths
        .iter()
        .map(|p| {
            let contents = std::fs::read_to_string(p)
                .unwrap_or_else(|e| throw_error(2, &format!("could not read `{}`: {}", p, e)));
            let mut lines = contents.lines();
            let x: u8 = lines
                .next()
                .and_then(|l| l.parse().ok())
                .unwrap_or_else(|| throw_error(2, &format!("`{}`: missing or invalid x", p)));
            let y = lines
                .next()
                .and_then(|l| hex::decode(l).ok())
                .unwrap_or_else(|| throw_error(2, &format!("`{}`: missing or invalid y", p)));
            let metadata = lines
                .next()
                .ok_or_else(|| ())
                .and_then(|l| ShareMetadata::from_encoded(l).map_err(|_| ()))
                .unwrap_or_else(|_| throw_error(2, &format!("`{}`: missing or invalid metadata", p)));
            Share { x, y, metadata }
        })
        .collect()
}

fn print_usage() -> ! {
    throw_error(
        1,
        "usage: resilience-core rs-encode <file> <k> <m> <shard_size> <out_dir>\n   or: resilience-core rs-decode <shard_file>...\n   or: resilience-core sss-split <file> <k> <n> <out_dir>\n   or: resilience-core sss-combine <share_file>...",
    );
}

fn main() {
    tracing_subscriber::fmt::try_init().expect("cannot init logger");

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| print_usage());
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "rs-encode" => {
            let [path, k, m, shard_size, out_dir] = <[String; 5]>::try_from(rest)
                .unwrap_or_else(|_| print_usage());
            let data = std::fs::read(&path)
                .unwrap_or_else(|e| throw_error(2, &format!("could not read `{}`: {}", path, e)));
            let config = EncodingConfig::new(
                k.parse().unwrap_or_else(|_| throw_error(1, "k must be a u8")),
                m.parse().unwrap_or_else(|_| throw_error(1, "m must be a u8")),
                shard_size
                    .parse()
                    .unwrap_or_else(|_| throw_error(1, "shard_size must be a usize")),
            )
            .unwrap_or_else(|e| throw_error(1, &format!("invalid config: {}", e)));

            let shards = rs::encode(&data, config)
                .unwrap_or_else(|e| throw_error(1, &format!("could not encode: {}", e)));
            dump_shards(&shards, &PathBuf::from(out_dir))
                .unwrap_or_else(|e| throw_error(1, &format!("could not dump shards: {}", e)));
        }
        "rs-decode" => {
            if rest.is_empty() {
                print_usage();
            }
            match rs::decode(read_shards(&rest)) {
                ReconstructionResult::Success(data) => {
                    std::io::stdout().write_all(&data).unwrap();
                }
                ReconstructionResult::Partial { recovered, total } => {
                    warn!("only recovered {} of {} bytes", recovered.len(), total);
                    exit(3);
                }
                ReconstructionResult::Failure(e) => {
                    throw_error(4, &format!("could not decode: {}", e));
                }
            }
        }
        "sss-split" => {
            let [path, k, n, out_dir] =
                <[String; 4]>::try_from(rest).unwrap_or_else(|_| print_usage());
            let secret = std::fs::read(&path)
                .unwrap_or_else(|e| throw_error(2, &format!("could not read `{}`: {}", path, e)));
            let config = SSSConfig::new(
                k.parse().unwrap_or_else(|_| throw_error(1, "k must be a u8")),
                n.parse().unwrap_or_else(|_| throw_error(1, "n must be a u8")),
                true,
                secret.len().max(1),
            )
            .unwrap_or_else(|e| throw_error(1, &format!("invalid config: {}", e)));

            let shares = sss::split(&secret, config, &mut OsRng)
                .unwrap_or_else(|e| throw_error(1, &format!("could not split: {}", e)));
            dump_shares(&shares, &PathBuf::from(out_dir))
                .unwrap_or_else(|e| throw_error(1, &format!("could not dump shares: {}", e)));
        }
        "sss-combine" => {
            if rest.is_empty() {
                print_usage();
            }
            let secret = sss::combine(read_shares(&rest))
                .unwrap_or_else(|e| throw_error(1, &format!("could not combine: {}", e)));
            std::io::stdout().write_all(&secret).unwrap();
        }
        _ => print_usage(),
    }
}
