use futures::executor::LocalPool;
use glue_core::GlueError;
use glue_core::GlueResult;
use glue_dom::Document;
use glue_html::HtmlParser;
use glue_net::Http11Client;
use glue_net::NavigationRequest;
use glue_net::ThreadedNetwork;
use glue_net::normalize_location;
use glue_router::NavigateOptions;
use glue_router::PopStateOutcome;
use glue_router::Router;
use glue_router::RouterConfig;
use glue_router::SessionHistory;
use glue_router::Window;
use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: glue-probe <start-url> [--cache-capacity N] \
                     [PATH | --replace PATH | --prefetch PATH | --back | --forward]...";

type ProbeRouter = Router<Document, SessionHistory>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Push(String),
    Replace(String),
    Prefetch(String),
    Back,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProbeOptions {
    start_url: String,
    cache_capacity: Option<usize>,
    steps: Vec<Step>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = match probe_options_from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("glue-probe: {error}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(options) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("glue-probe: {failed} step(s) failed");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("glue-probe: {error}");
            ExitCode::FAILURE
        }
    }
}

fn probe_options_from_args(
    args: impl IntoIterator<Item = String>,
) -> Result<ProbeOptions, String> {
    let mut args = args.into_iter();
    let mut start_url = None;
    let mut cache_capacity = None;
    let mut steps = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cache-capacity" => {
                let raw = args
                    .next()
                    .ok_or_else(|| "missing value after --cache-capacity".to_owned())?;
                let capacity = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|capacity| *capacity > 0)
                    .ok_or_else(|| format!("invalid cache capacity `{raw}`"))?;
                cache_capacity = Some(capacity);
            }
            "--replace" | "--prefetch" => {
                let path = args
                    .next()
                    .ok_or_else(|| format!("missing path after {arg}"))?;
                steps.push(if arg == "--replace" {
                    Step::Replace(path)
                } else {
                    Step::Prefetch(path)
                });
            }
            "--back" => steps.push(Step::Back),
            "--forward" => steps.push(Step::Forward),
            flag if flag.starts_with("--") => return Err(format!("unknown option `{flag}`")),
            _ if start_url.is_none() => start_url = Some(arg),
            _ => steps.push(Step::Push(arg)),
        }
    }

    let start_url = start_url.ok_or_else(|| "missing start URL".to_owned())?;
    Ok(ProbeOptions {
        start_url,
        cache_capacity,
        steps,
    })
}

/// Runs every step and returns how many failed.
fn run(options: ProbeOptions) -> GlueResult<usize> {
    let mut config = RouterConfig::from_env()?;
    if options.cache_capacity.is_some() {
        config = config.with_cache_capacity(options.cache_capacity);
    }

    let client = Http11Client::new()?;
    let start = normalize_location(&options.start_url)?;
    let request = NavigationRequest::get(start.as_str())
        .with_header(&config.request_header_name, &config.request_header_value)?;
    let response = client.fetch(&request)?;
    if !response.is_success() {
        return Err(GlueError::http(
            "probe.start.status",
            format!("HTTP {} for {}", response.status, response.url),
        ));
    }
    if response.was_redirected() {
        info!(
            requested = start.as_str(),
            landed = response.url.as_str(),
            hops = response.redirects.len(),
            "start page redirected"
        );
    }
    let document = HtmlParser.parse(&response.text())?;

    let mut pool = LocalPool::new();
    let router = Router::with_parts(
        config,
        document,
        ThreadedNetwork::new(client),
        SessionHistory::new(&response.url),
        pool.spawner(),
    )?;

    let navigations = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&navigations);
    router.on_navigated(move || counter.set(counter.get() + 1));

    info!(
        url = router.current_url().as_str(),
        steps = options.steps.len(),
        "probe started"
    );
    println!("start {}", summarize(&router));

    let mut failed = 0;
    for step in options.steps {
        let result = match &step {
            Step::Push(path) => pool.run_until(router.push(path, NavigateOptions::default())),
            Step::Replace(path) => {
                pool.run_until(router.replace(path, NavigateOptions::default()))
            }
            Step::Prefetch(path) => {
                router.prefetch(path);
                pool.run_until_stalled();
                Ok(())
            }
            Step::Back => {
                router.back();
                drain_pop_states(&router)
            }
            Step::Forward => {
                router.forward();
                drain_pop_states(&router)
            }
        };

        match result {
            Ok(()) => println!("{step:?} -> {}", summarize(&router)),
            Err(error) => {
                failed += 1;
                println!("{step:?} failed: {error}");
            }
        }
    }

    pool.run();
    info!(
        navigations = navigations.get(),
        cached = router.fetcher().cache_len(),
        "probe finished"
    );
    Ok(failed)
}

fn drain_pop_states(router: &ProbeRouter) -> GlueResult<()> {
    while router.window_mut().take_pop_state() {
        if router.handle_pop_state()? == PopStateOutcome::Reloaded {
            println!("reload requested for {}", router.window().location());
        }
    }
    Ok(())
}

fn summarize(router: &ProbeRouter) -> String {
    let url = router.current_url();
    let Some(snapshot) = router.fetcher().cached(&url) else {
        return format!("{url} (not cached)");
    };

    let layouts: Vec<&str> = snapshot.layouts.keys().map(String::as_str).collect();
    format!(
        "{url} title={:?} page={}B layouts=[{}] head={} scripts={}",
        snapshot.title.as_deref().unwrap_or(""),
        snapshot.body_html.len(),
        layouts.join(","),
        snapshot.head_content.as_ref().map_or(0, Vec::len),
        snapshot.scripts.len(),
    )
}
