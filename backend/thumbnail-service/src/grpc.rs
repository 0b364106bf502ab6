// gRPC service implementation for thumbnail service
use crate::config::Config;
use crate::error::AppError;
use crate::models::{MediaBuffer, ThumbnailResult};
use crate::services::thumbnail::{RequestValidator, ThumbnailProcessor};
use std::time::Instant;
use tokio::sync::watch;
use tonic::{Request, Response, Status};

// Import generated proto code from thumbnail_service.proto
pub mod thumbnail {
    pub mod v1 {
        tonic::include_proto!("thumbnail.v1");
    }
}

use thumbnail::v1::thumbnail_service_server::{ThumbnailService, ThumbnailServiceServer};
use thumbnail::v1::*;

/// ThumbnailService gRPC implementation
#[derive(Clone)]
pub struct ThumbnailServiceImpl {
    processor: ThumbnailProcessor,
    validator: RequestValidator,
}

impl ThumbnailServiceImpl {
    pub fn new(processor: ThumbnailProcessor, validator: RequestValidator) -> Self {
        Self {
            processor,
            validator,
        }
    }

    async fn image_thumbnail(
        &self,
        req: ImageThumbnailRequest,
    ) -> Result<ThumbnailResponse, AppError> {
        self.validator.check_image_payload(req.image_data.len())?;
        let request = self
            .validator
            .image_request(req.width, req.height, req.quality, req.blur);

        let result = self
            .processor
            .process_image(MediaBuffer::new(req.image_data, req.mime_type), &request)
            .await?;
        Ok(thumbnail_success(result))
    }

    async fn video_thumbnail(
        &self,
        req: VideoThumbnailRequest,
    ) -> Result<ThumbnailResponse, AppError> {
        self.validator.check_video_payload(req.video_data.len())?;
        let request = self.validator.video_request(
            req.width,
            req.height,
            req.quality,
            req.blur,
            &req.timestamp,
        )?;

        let result = self
            .processor
            .process_video(MediaBuffer::new(req.video_data, req.mime_type), &request)
            .await?;
        Ok(thumbnail_success(result))
    }

    async fn dimensions(
        &self,
        req: ImageDimensionsRequest,
    ) -> Result<ImageDimensionsResponse, AppError> {
        if req.image_data.is_empty() {
            return Err(AppError::Validation("image data is required".to_string()));
        }

        let dims = self
            .processor
            .image_dimensions(MediaBuffer::new(req.image_data, req.mime_type))
            .await?;

        Ok(ImageDimensionsResponse {
            success: true,
            width: dims.width as i32,
            height: dims.height as i32,
            size_bytes: dims.size_bytes as i64,
            error_message: String::new(),
        })
    }
}

fn thumbnail_success(result: ThumbnailResult) -> ThumbnailResponse {
    ThumbnailResponse {
        success: true,
        thumbnail_base64: result.encoded_payload,
        mime_type: result.mime_type.to_string(),
        width: result.width as i32,
        height: result.height as i32,
        size_bytes: result.size_bytes as i64,
        error_message: String::new(),
    }
}

/// Business failures become `success: false` responses; anything else is a
/// transport-level status.
fn business_failure<T>(
    err: AppError,
    failure: impl FnOnce(String) -> T,
    started_at: Instant,
) -> Result<Response<T>, Status> {
    let elapsed_ms = started_at.elapsed().as_millis() as u64;
    if err.is_business() {
        tracing::warn!(error = %err, elapsed_ms, "gRPC request rejected");
        Ok(Response::new(failure(err.to_string())))
    } else {
        tracing::error!(error = %err, elapsed_ms, "gRPC request failed");
        Err(err.into())
    }
}

fn thumbnail_failure(message: String) -> ThumbnailResponse {
    ThumbnailResponse {
        success: false,
        error_message: message,
        ..Default::default()
    }
}

fn dimensions_failure(message: String) -> ImageDimensionsResponse {
    ImageDimensionsResponse {
        success: false,
        error_message: message,
        ..Default::default()
    }
}

#[tonic::async_trait]
impl ThumbnailService for ThumbnailServiceImpl {
    /// Generate a thumbnail from raw image bytes
    #[tracing::instrument(skip(self, request), fields(mime_type = %request.get_ref().mime_type, size = request.get_ref().image_data.len()))]
    async fn generate_image_thumbnail(
        &self,
        request: Request<ImageThumbnailRequest>,
    ) -> Result<Response<ThumbnailResponse>, Status> {
        let started_at = Instant::now();
        let req = request.into_inner();

        tracing::info!(
            width = req.width,
            height = req.height,
            quality = req.quality,
            blur = req.blur,
            "Processing image thumbnail request"
        );

        match self.image_thumbnail(req).await {
            Ok(response) => {
                tracing::info!(
                    width = response.width,
                    height = response.height,
                    size_bytes = response.size_bytes,
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "GenerateImageThumbnail completed"
                );
                Ok(Response::new(response))
            }
            Err(e) => business_failure(e, thumbnail_failure, started_at),
        }
    }

    /// Generate a thumbnail from one frame of a video
    #[tracing::instrument(skip(self, request), fields(mime_type = %request.get_ref().mime_type, size = request.get_ref().video_data.len()))]
    async fn generate_video_thumbnail(
        &self,
        request: Request<VideoThumbnailRequest>,
    ) -> Result<Response<ThumbnailResponse>, Status> {
        let started_at = Instant::now();
        let req = request.into_inner();

        tracing::info!(
            timestamp = %req.timestamp,
            width = req.width,
            height = req.height,
            quality = req.quality,
            blur = req.blur,
            "Processing video thumbnail request"
        );

        match self.video_thumbnail(req).await {
            Ok(response) => {
                tracing::info!(
                    width = response.width,
                    height = response.height,
                    size_bytes = response.size_bytes,
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "GenerateVideoThumbnail completed"
                );
                Ok(Response::new(response))
            }
            Err(e) => business_failure(e, thumbnail_failure, started_at),
        }
    }

    /// Report the dimensions of an image
    #[tracing::instrument(skip(self, request), fields(mime_type = %request.get_ref().mime_type, size = request.get_ref().image_data.len()))]
    async fn get_image_dimensions(
        &self,
        request: Request<ImageDimensionsRequest>,
    ) -> Result<Response<ImageDimensionsResponse>, Status> {
        let started_at = Instant::now();

        match self.dimensions(request.into_inner()).await {
            Ok(response) => Ok(Response::new(response)),
            Err(e) => business_failure(e, dimensions_failure, started_at),
        }
    }
}

/// Start gRPC server for ThumbnailService
pub async fn start_grpc_server(
    addr: std::net::SocketAddr,
    config: &Config,
    service: ThumbnailServiceImpl,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    use tonic::transport::Server;

    tracing::info!("Starting gRPC server at {}", addr);

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ThumbnailServiceServer<ThumbnailServiceImpl>>()
        .await;

    let max_message_size = config.grpc.max_message_size;
    let thumbnail_service = ThumbnailServiceServer::new(service)
        .max_decoding_message_size(max_message_size)
        .max_encoding_message_size(max_message_size);

    Server::builder()
        .concurrency_limit_per_connection(config.limits.max_concurrent_jobs.max(1))
        .add_service(health_service)
        .add_service(thumbnail_service)
        .serve_with_shutdown(addr, async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("gRPC server draining in-flight requests");
        })
        .await?;

    Ok(())
}
