use std::sync::Arc;

use crate::application::auth::AuthService;
use crate::application::request_logs::RequestLogService;
use crate::application::vehicles::VehicleService;

#[derive(Clone)]
pub struct ApiState {
    pub vehicles: Arc<VehicleService>,
    pub request_logs: Arc<RequestLogService>,
    pub auth: Arc<AuthService>,
}
