//! Walks a live CI host the way a delivery pipeline would.
//!
//! Build with:
//! ```bash
//! cargo run --example pipeline_probe
//! # or: cargo run --no-default-features --features native-tls,tracing --example pipeline_probe
//! ```
//!
//! Set env vars to run against a real server:
//! - `JENKINS_URL` (e.g. `https://jenkins.example.com`)
//! - `JENKINS_USER`, `JENKINS_TOKEN` (optional, but most instances require auth)
//! - `JENKINS_CSRF=1` when the server has CSRF protection enabled
//! - `JENKINS_JOB` (folder-qualified, default: `core`)
//! - `JENKINS_BUILD` (build number; default: newest build of the job)
//! - `JENKINS_PROPERTIES` (artifact file name, default: `build.properties`)
//! - `JENKINS_TRIGGER=1` to actually trigger a build (POST)

use jenkins_adapter::{CiService, HttpCiClient, JobName, RetryPolicy};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let base_url = env_or("JENKINS_URL", "https://jenkins.example.com");
    let job = JobName::new(env_or("JENKINS_JOB", "core"));
    let properties = env_or("JENKINS_PROPERTIES", "build.properties");
    let trigger = env_bool("JENKINS_TRIGGER");

    let mut builder = HttpCiClient::builder(&base_url)?
        .no_system_proxy()
        .timeout(Duration::from_secs(20));

    if let (Some(user), Some(token)) = (env_opt("JENKINS_USER"), env_opt("JENKINS_TOKEN")) {
        builder = builder.auth_basic(user, token);
    }

    let service = CiService::new(builder.build()?)
        .csrf(env_bool("JENKINS_CSRF"))
        .retry_policy(RetryPolicy::new(2, Duration::from_millis(200)));

    let names = service.list_job_names()?;
    println!("{} jobs, first three:", names.len());
    for name in names.iter().take(3) {
        println!("  - {name}");
    }

    let number = match env_opt("JENKINS_BUILD") {
        Some(n) => n.parse()?,
        None => match service.list_builds(&job)?.first() {
            Some(build) => build.number,
            None => {
                println!("{job} has no builds yet");
                return Ok(());
            }
        },
    };

    let build = service.get_build(&job, number)?;
    println!(
        "{job} #{}: {:?}, {} artifact(s)",
        build.number,
        build.result,
        build.artifacts.len()
    );

    let props = service.get_build_properties(&job, number, &properties)?;
    println!("{properties}: {} key(s)", props.len());
    for (key, value) in props.iter().take(5) {
        println!("  {key} = {value}");
    }

    for revision in service.get_git_revisions(&job, number)? {
        println!(
            "revision: {} @ {} ({})",
            revision.branch,
            revision.sha1,
            revision.remote_url.as_deref().unwrap_or("<no remote>")
        );
    }

    if trigger {
        let triggered = service.trigger_build(&job, &[])?;
        println!("triggered: {triggered:?}");
    } else {
        println!("skipping trigger (set JENKINS_TRIGGER=1 to enable)");
    }

    Ok(())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str) -> bool {
    matches!(
        std::env::var(name)
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
