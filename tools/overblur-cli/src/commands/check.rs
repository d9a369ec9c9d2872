//! Check that the external tools are available.

use overblur_common::config::MAX_MUXING_QUEUE_SIZE_ENV;
use overblur_media::media_info::command_exists;

pub fn run() -> anyhow::Result<()> {
    println!("overblur System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for binary in ["ffmpeg", "ffprobe"] {
        if command_exists(binary) {
            println!("[OK] {binary} found in PATH");
        } else {
            println!("[MISSING] {binary} not found in PATH");
            all_ok = false;
        }
    }

    match std::env::var(MAX_MUXING_QUEUE_SIZE_ENV) {
        Ok(value) => println!("[OK] {MAX_MUXING_QUEUE_SIZE_ENV}={value}"),
        Err(_) => println!("[--] {MAX_MUXING_QUEUE_SIZE_ENV} not set"),
    }

    println!();
    if all_ok {
        println!("All required tools are available. overblur is ready.");
        Ok(())
    } else {
        anyhow::bail!("ffmpeg and ffprobe must be installed and in PATH")
    }
}
