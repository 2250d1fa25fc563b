use actix_web::{web, HttpRequest, HttpResponse};

use crate::controller::LaunchController;
use crate::error::LaunchError;

/// `GET /fhir_redirect`: the authorization server sends the browser back here
///
/// # Errors
///
/// See [`LaunchController::fhir_redirect`]
pub async fn fhir_redirect(
    req: HttpRequest,
    controller: web::Data<LaunchController>,
) -> Result<HttpResponse, LaunchError> {
    controller.fhir_redirect(&req).await
}
