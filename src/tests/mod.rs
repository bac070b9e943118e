
pub(crate) use base::*;
