use std::sync::Arc;

use causa_auth::IdentityResolver;
use causa_core::CausaApp;

pub struct CausaAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: Arc<CausaApp<R, P>>,
    pub resolver: IdentityResolver,
}

impl<R, P> Clone for CausaAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            resolver: self.resolver.clone(),
        }
    }
}

impl<R, P> CausaAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: CausaApp<R, P>, resolver: IdentityResolver) -> Self {
        Self {
            app: Arc::new(app),
            resolver,
        }
    }
}
