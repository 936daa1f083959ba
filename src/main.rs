mod config;
mod err;
mod http;
mod opt;
mod path;
mod store;
mod tcp;

#[tokio::main]
async fn main() -> Result<(), err::DisplayError> {
    let options: opt::Options = clap::Parser::parse();
    let listen = options.listen();
    let opt::Options {
        verbose,
        quiet,
        root,
        no_cors,
        ..
    } = options;

    env_logger::Builder::new()
        .filter_level(match (quiet, verbose) {
            (true, _) => log::LevelFilter::Off,
            (false, 0) => log::LevelFilter::Info,
            (false, 1) => log::LevelFilter::Debug,
            (false, _) => log::LevelFilter::Trace,
        })
        .init();

    let listener = tcp::bind(listen).await?;
    log::info!("Serving {}", root.display());

    http::serve(
        listener,
        http::response::Framing { cors: !no_cors },
        store::State::new(root),
        store::respond_to_request,
    )
    .await?;

    Ok(())
}
