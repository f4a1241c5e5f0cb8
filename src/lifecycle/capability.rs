use crate::error::ServiceError;
use std::sync::Arc;

/// Host-level service API the controller calls into.
///
/// Implementations talk to whatever actually keeps the service alive (an OS
/// service manager, a platform foreground service, a dedicated runtime
/// thread). The context is owned by the caller and only borrowed for the
/// duration of a call.
pub trait ServiceCapability: Send + Sync {
    type Context: Send + Sync + 'static;

    fn begin_service(&self, context: &Self::Context) -> Result<(), ServiceError>;

    fn end_service(&self, context: &Self::Context) -> Result<(), ServiceError>;
}

impl<T: ServiceCapability + ?Sized> ServiceCapability for Arc<T> {
    type Context = T::Context;

    fn begin_service(&self, context: &Self::Context) -> Result<(), ServiceError> {
        (**self).begin_service(context)
    }

    fn end_service(&self, context: &Self::Context) -> Result<(), ServiceError> {
        (**self).end_service(context)
    }
}
