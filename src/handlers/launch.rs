use actix_web::{web, HttpRequest, HttpResponse};

use crate::controller::LaunchController;
use crate::error::LaunchError;

/// `GET /launch`: start a SMART launch from the EHR
///
/// # Errors
///
/// See [`LaunchController::launch`]
pub async fn launch(
    req: HttpRequest,
    controller: web::Data<LaunchController>,
) -> Result<HttpResponse, LaunchError> {
    controller.launch(&req).await
}
