use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use envstack::template::validate_stack_name;
use envstack::variables::load_dot_env;
use envstack::verify::{check_all, checks_for, make_agent};
use envstack::{compose, ComposeSettings, Composition, ProvisioningContext, DEFAULT_REGION};

#[derive(Parser)]
#[command(name = "envstack")]
#[command(about = "Declare and deploy the current and pilot message APIs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    stack: StackArgs,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log json lines instead of text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StackArgs {
    /// Route53 hosted zone id, without the /hostedzone/ prefix
    #[arg(long, env = "HOSTED_ZONE_ID", global = true)]
    hosted_zone_id: Option<String>,

    /// Name of the hosted zone, eg: example.com
    #[arg(long, env = "ZONE_NAME", global = true)]
    zone_name: Option<String>,

    /// Regional ACM certificate covering every environment record
    #[arg(long, env = "ACM_ARN", global = true)]
    acm_arn: Option<String>,

    /// us-east-1 ACM certificate for the CloudFront distributions
    #[arg(long, env = "ACM_US_ARN", global = true)]
    acm_us_arn: Option<String>,

    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION, global = true)]
    region: String,

    #[arg(long, env = "STACK_NAME", default_value = "ExStack", global = true)]
    stack_name: String,

    /// Put a CloudFront distribution in front of every environment
    #[arg(long = "edge", env = "EDGE_ENABLED", global = true)]
    edge_enabled: bool,

    /// Edge record of environment `x` is `{prefix}x`
    #[arg(long, env = "EDGE_RECORD_PREFIX", default_value = envstack::provision::DEFAULT_EDGE_RECORD_PREFIX, global = true)]
    edge_record_prefix: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the template and a deploy script that deploys it with the aws cli
    Synth {
        #[arg(long, default_value = "deploy.json")]
        output: PathBuf,

        #[arg(long, default_value = "deploy.sh")]
        script: PathBuf,
    },

    /// Create or update the stack and print its outputs
    Deploy,

    /// Request every environment and check its answer
    Verify {
        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

impl StackArgs {
    fn context(&self) -> Result<ProvisioningContext> {
        let hosted_zone_id = required(&self.hosted_zone_id, "--hosted-zone-id", "HOSTED_ZONE_ID")?;
        let zone_name = required(&self.zone_name, "--zone-name", "ZONE_NAME")?;
        let acm_arn = required(&self.acm_arn, "--acm-arn", "ACM_ARN")?;
        let mut ctx = ProvisioningContext::new(hosted_zone_id, zone_name, acm_arn, self.region.as_str())?;
        if self.edge_enabled {
            let acm_us_arn = required(&self.acm_us_arn, "--acm-us-arn", "ACM_US_ARN")?;
            ctx = ctx.with_edge_certificate(acm_us_arn)?;
        }
        Ok(ctx)
    }

    fn compose(&self) -> Result<Composition> {
        let ctx = self.context()?;
        let settings = ComposeSettings {
            edge_enabled: self.edge_enabled,
            edge_record_prefix: self.edge_record_prefix.clone(),
            ..Default::default()
        };
        Ok(compose(&ctx, &settings)?)
    }
}

fn required<'a>(value: &'a Option<String>, flag: &str, var: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("Missing {flag}, pass it or set {var}"),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn deploy_script(region: &str, stack_name: &str, template_file: &Path) -> String {
    format!(
        "#!/usr/bin/env bash\nset -e\naws --region {region} cloudformation deploy --stack-name {stack_name} --template-file {} --capabilities CAPABILITY_NAMED_IAM CAPABILITY_IAM\n",
        template_file.display(),
    )
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| envstack::Error::WriteFile { path: path.to_path_buf(), source })?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).with_context(|| format!("Failed to make {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn synth(args: &StackArgs, output: &Path, script: &Path) -> Result<()> {
    let stack_name = validate_stack_name(&args.stack_name)?;
    let composition = args.compose()?;
    let body = composition.template.to_json_pretty()?;
    write_file(output, &body)?;
    write_file(script, &deploy_script(&args.region, &stack_name, output))?;
    make_executable(script)?;
    info!(template = %output.display(), script = %script.display(), resources = composition.template.resources.len(), "wrote template");
    Ok(())
}

async fn deploy(args: &StackArgs) -> Result<()> {
    let stack_name = validate_stack_name(&args.stack_name)?;
    let composition = args.compose()?;
    let body = composition.template.to_json_pretty()?;
    let client = aws_cfn_stack::make_client(&args.region).await;
    info!(stack = stack_name.as_str(), region = args.region.as_str(), "deploying");
    let outputs = aws_cfn_stack::deploy_stack(&client, &stack_name, &body)
        .await
        .with_context(|| format!("Failed to deploy stack {stack_name}"))?;
    let mut outputs: Vec<_> = outputs.into_iter().collect();
    outputs.sort();
    for (key, value) in outputs {
        println!("{key} = {value}");
    }
    Ok(())
}

fn verify(args: &StackArgs, timeout: u64) -> Result<()> {
    let composition = args.compose()?;
    let checks = checks_for(&composition);
    let agent = make_agent(Duration::from_secs(timeout));
    let failed = check_all(&agent, &checks);
    if failed > 0 {
        bail!("{failed} of {} endpoint checks failed", checks.len());
    }
    info!(checks = checks.len(), "every endpoint answers as expected");
    Ok(())
}

fn main() -> Result<()> {
    // loaded before any runtime thread exists, values become defaults for the env backed flags
    let env_file = std::env::var("ENV_FILE").unwrap_or_else(|_| ".env".to_string());
    let loaded = load_dot_env(&env_file)?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);
    debug!(env_file = env_file.as_str(), loaded, "loaded .env");

    match cli.command {
        Commands::Synth { output, script } => synth(&cli.stack, &output, &script),
        // only the CloudFormation client is async, synth and verify stay blocking
        Commands::Deploy => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start the tokio runtime")?;
            runtime.block_on(deploy(&cli.stack))
        }
        Commands::Verify { timeout } => verify(&cli.stack, timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deploy_script_runs_cloudformation_deploy() {
        let script = deploy_script("ap-northeast-1", "ExStack", Path::new("deploy.json"));
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(script.contains("aws --region ap-northeast-1 cloudformation deploy --stack-name ExStack --template-file deploy.json --capabilities CAPABILITY_NAMED_IAM CAPABILITY_IAM"));
    }

    #[test]
    fn flags_build_the_context() {
        let cli = Cli::try_parse_from([
            "envstack", "--hosted-zone-id", "Z1", "--zone-name", "example.com", "--acm-arn", "arn:cert:1",
            "--region", "ap-northeast-1", "synth",
        ]).unwrap();
        let ctx = cli.stack.context().unwrap();
        assert_eq!(ctx.zone_name(), "example.com");
        assert!(ctx.edge_certificate.is_none());
    }

    #[test]
    fn dot_env_values_become_flag_defaults() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "STACK_NAME=FromDotEnv").unwrap();
        std::env::remove_var("STACK_NAME");
        load_dot_env(file.path()).unwrap();
        let cli = Cli::try_parse_from(["envstack", "synth"]).unwrap();
        assert_eq!(cli.stack.stack_name, "FromDotEnv");
        std::env::remove_var("STACK_NAME");
    }

    #[test]
    fn edge_needs_the_us_certificate() {
        let cli = Cli::try_parse_from([
            "envstack", "--hosted-zone-id", "Z1", "--zone-name", "example.com", "--acm-arn", "arn:cert:1",
            "--region", "ap-northeast-1", "--edge", "--acm-us-arn", "", "synth",
        ]).unwrap();
        assert!(cli.stack.context().is_err());
    }
}
