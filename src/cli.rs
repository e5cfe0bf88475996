use crate::{
    dns_types::{Class, RecordType},
    error::ArgError,
    resolver::{Request, ResolverConfig, ServerOverride},
};
use std::time::Duration;

const HELP: &str = "\
rootwalk -- resolve a name by walking referrals down from the root servers
USAGE:
  rootwalk [OPTIONS] NAME
FLAGS:
  -h, --help                Prints help information
  -v, --verbose             Log every query and referral to stderr
OPTIONS:
  -t, --type TYPE           Record type to ask for (A, CNAME, AAAA etc). Default A
  -c, --class CLASS         Class to ask for (IN, CS, CH, HS, ANY). Default IN
  -s, --server SERVER       Start at this server instead of a random root. Either a root
                            server letter (a to m) or an IPv4 address
      --max-hops N          Give up after sending this many queries. Default 20
      --timeout SECS        Per-connection timeout, 0 for none. Default 5
ARGS:
  NAME A domain name to look up. Remember, these must be ASCII.
";

/// Values derived from the CLI arguments.
#[derive(Debug)]
pub struct AppArgs {
    pub request: Request,
    pub config: ResolverConfig,
    pub timeout: Option<Duration>,
    pub verbose: bool,
}

impl AppArgs {
    pub fn parse() -> Result<Self, ArgError> {
        let mut pargs = pico_args::Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            print!("{}", HELP);
            std::process::exit(0);
        }
        Self::from_args(pargs)
    }

    fn from_args(mut pargs: pico_args::Arguments) -> Result<Self, ArgError> {
        let verbose = pargs.contains(["-v", "--verbose"]);
        // Read as strings first so bad values get our own error messages.
        let record_type = match pargs.opt_value_from_str::<_, String>(["-t", "--type"])? {
            Some(s) => s.parse()?,
            None => RecordType::A,
        };
        let class = match pargs.opt_value_from_str::<_, String>(["-c", "--class"])? {
            Some(s) => s.parse()?,
            None => Class::IN,
        };
        let server = pargs
            .opt_value_from_str::<_, String>(["-s", "--server"])?
            .map(|s| s.parse::<ServerOverride>())
            .transpose()?;
        let mut config = ResolverConfig::default();
        if let Some(max_hops) = pargs.opt_value_from_str("--max-hops")? {
            config.max_hops = max_hops;
        }
        let timeout = match pargs.opt_value_from_str::<_, u64>("--timeout")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs(5)),
        };
        let domain_name: String = pargs.free_from_str()?;

        let remaining = pargs.finish();
        if let Some(extra) = remaining.first() {
            return Err(ArgError::UnexpectedArgument(
                extra.to_string_lossy().into_owned(),
            ));
        }

        Ok(AppArgs {
            request: Request {
                domain_name,
                record_type,
                class,
                server,
            },
            config,
            timeout,
            verbose,
        })
    }
}
