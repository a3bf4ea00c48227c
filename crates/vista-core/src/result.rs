use crate::error::VistaError;

pub type VistaResult<T> = Result<T, VistaError>;
