use std::{process, sync::Arc};

use icona::{
    application::{
        activation,
        error::AppError,
        favicon::FaviconService,
        repos::{AttachmentStore, ImagePipeline, OptionStore, SiteRoot},
        resolver::{FaviconResolver, ResolverConfig},
        uploads::FaviconUploadService,
    },
    cache::{CacheConfig, PathCache},
    config,
    infra::{
        error::InfraError,
        http::{self, AdminState, HttpState},
        images::CliImagePipeline,
        options::FileOptionStore,
        site_root::FsSiteRoot,
        telemetry,
        uploads::UploadAttachments,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let app = build_application_context(&settings)?;

    match command {
        config::Command::Serve(_) => run_serve(&settings, app).await,
        config::Command::Resolve(args) => {
            let path = if args.fresh {
                app.favicon.refresh().await.path
            } else {
                app.favicon.current_path().await
            };
            println!("{path}");
            Ok(())
        }
        config::Command::Render(args) => {
            println!("{}", app.favicon.head_markup(args.slot).await);
            Ok(())
        }
        config::Command::ClearCache => {
            app.favicon.clear_cache().await?;
            Ok(())
        }
        config::Command::SetUpload(args) => {
            app.uploads.set_upload(&args.attachment_id).await?;
            Ok(())
        }
        config::Command::ClearUpload => {
            app.uploads.clear_upload().await?;
            Ok(())
        }
        config::Command::Check => {
            activation::activate(app.pipeline.as_ref())?;
            println!("ok");
            Ok(())
        }
    }
}

async fn run_serve(settings: &config::Settings, app: ApplicationContext) -> Result<(), AppError> {
    activation::activate(app.pipeline.as_ref())?;

    let http_state = HttpState {
        favicon: app.favicon.clone(),
    };
    let admin_state = AdminState {
        favicon: app.favicon,
        uploads: app.uploads,
    };

    serve_http(settings, http_state, admin_state).await
}

struct ApplicationContext {
    favicon: Arc<FaviconService>,
    uploads: Arc<FaviconUploadService>,
    pipeline: Arc<dyn ImagePipeline>,
}

fn build_application_context(settings: &config::Settings) -> Result<ApplicationContext, AppError> {
    let pipeline: Arc<dyn ImagePipeline> =
        Arc::new(CliImagePipeline::new(settings.images.cli_path.clone()));

    let options: Arc<dyn OptionStore> =
        Arc::new(FileOptionStore::new(settings.options.path.clone())?);
    let attachments: Arc<dyn AttachmentStore> = Arc::new(
        UploadAttachments::new(
            settings.uploads.directory.clone(),
            &settings.uploads.public_url,
            pipeline.clone(),
        )
        .map_err(|err| {
            AppError::from(InfraError::configuration(format!(
                "failed to prepare uploads storage `{}`: {err}",
                settings.uploads.directory.display()
            )))
        })?,
    );
    let site_root: Arc<dyn SiteRoot> = Arc::new(FsSiteRoot::new(settings.site.root.clone()));

    let cache_config = CacheConfig::from(settings);
    let cache = PathCache::new(options.clone(), &cache_config);

    let resolver_config = ResolverConfig::new(
        settings.site.has_upload_panel,
        settings.site.url.clone(),
        settings.site.default_asset_url.clone(),
    )?;
    let resolver = FaviconResolver::new(
        resolver_config,
        options.clone(),
        attachments.clone(),
        site_root,
    );

    let favicon = Arc::new(FaviconService::new(resolver, cache.clone()));
    let uploads = Arc::new(FaviconUploadService::new(
        options,
        attachments,
        cache,
        settings.site.has_upload_panel,
        cache_config.invalidate_on_upload_change,
    ));

    Ok(ApplicationContext {
        favicon,
        uploads,
        pipeline,
    })
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "icona::serve",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        "Listening"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
