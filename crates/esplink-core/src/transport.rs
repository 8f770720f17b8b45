// ── Transport seam ──
//
// The only way the core talks to a device. `DeviceClient` is the real
// implementation; tests substitute scripted fakes.

use futures_util::future::BoxFuture;

use esplink_api::{Control, DeviceClient, StatusResponse};

/// Issues the two calls the device understands.
///
/// Object-safe so controllers can hold an `Arc<dyn Transport>`.
pub trait Transport: Send + Sync + 'static {
    /// `GET /api/status`
    fn get_status(&self) -> BoxFuture<'_, Result<StatusResponse, esplink_api::Error>>;

    /// `POST /api/{endpoint}` for one control.
    fn post_control(&self, control: Control) -> BoxFuture<'_, Result<(), esplink_api::Error>>;
}

impl Transport for DeviceClient {
    fn get_status(&self) -> BoxFuture<'_, Result<StatusResponse, esplink_api::Error>> {
        Box::pin(DeviceClient::get_status(self))
    }

    fn post_control(&self, control: Control) -> BoxFuture<'_, Result<(), esplink_api::Error>> {
        Box::pin(DeviceClient::post_control(self, control))
    }
}
