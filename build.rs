use vergen::{BuildBuilder, Emitter};
use vergen_git2::Git2Builder;

// `--version` reads VERGEN_GIT_DESCRIBE and VERGEN_BUILD_TIMESTAMP.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_timestamp(true).build()?;

    match Git2Builder::default().describe(true, true, None).build() {
        Ok(git2) => {
            Emitter::default()
                .add_instructions(&build)?
                .add_instructions(&git2)?
                .emit()?;
        }
        Err(_) => {
            // No repository, e.g. a packaged source build
            println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
            Emitter::default().add_instructions(&build)?.emit()?;
        }
    }

    Ok(())
}
