/// Thumbnail Service - gRPC Server
///
/// Serves GenerateImageThumbnail, GenerateVideoThumbnail and
/// GetImageDimensions. Stops accepting requests on SIGINT/SIGTERM and lets
/// in-flight ones finish.
use std::net::SocketAddr;
use std::sync::Arc;
use thumbnail_service::grpc::{start_grpc_server, ThumbnailServiceImpl};
use thumbnail_service::services::thumbnail::{
    FfmpegFrameExtractor, RequestValidator, ThumbnailProcessor,
};
use thumbnail_service::Config;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    thumbnail_service::init_tracing("thumbnail_service=info");

    let config = Config::from_env()?;
    info!(
        grpc_port = config.grpc.port,
        max_concurrent_jobs = config.limits.max_concurrent_jobs,
        max_image_size = config.limits.max_image_size,
        max_video_size = config.limits.max_video_size,
        "Starting thumbnail service"
    );

    let grpc_addr: SocketAddr = config
        .grpc
        .bind_address()
        .parse()
        .map_err(|e| format!("Invalid gRPC bind address {}: {e}", config.grpc.bind_address()))?;

    let frame_extractor = Arc::new(FfmpegFrameExtractor::new(
        config.thumbnail.ffmpeg_path.clone(),
        config.thumbnail.temp_dir.clone(),
    ));
    let processor = ThumbnailProcessor::new(frame_extractor, config.thumbnail.data_uri);
    let validator = RequestValidator::new(config.limits.clone(), config.thumbnail.clone());
    let service = ThumbnailServiceImpl::new(processor, validator);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        thumbnail_service::shutdown_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = start_grpc_server(grpc_addr, &config, service, shutdown_rx).await {
        error!(error = %e, "gRPC server failed");
        return Err(e);
    }

    info!("Thumbnail service stopped");
    Ok(())
}
