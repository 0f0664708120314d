//! Buffer del lado productor con flush disparado por tamaño.
//!
//! Contrato:
//! - `append` guarda una copia del evento; si el buffer supera `buffer_size`
//!   (estrictamente mayor) se ejecuta `flush` en el acto.
//! - `flush` entrega todo al backend y vacía el buffer SIEMPRE, aun si el
//!   backend falla: un flush fallido equivale a descartar esos eventos.
//! - No hay flush automático al terminar. El productor debe llamar `flush`
//!   (o `finish`) al cerrar la sesión; lo que quede por debajo del umbral se
//!   pierde si no lo hace.
//! - No es seguro compartir una instancia entre productores concurrentes.

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::backend::StorageBackend;
use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::errors::BufferError;
use crate::event::AuditEvent;

pub struct EventBuffer<B: StorageBackend> {
    backend: B,
    buffer_size: usize,
    pending: Vec<AuditEvent>,
}

impl<B: StorageBackend> EventBuffer<B> {
    pub fn new(backend: B) -> Self {
        Self::with_buffer_size(backend, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(backend: B, buffer_size: usize) -> Self {
        Self { backend, buffer_size, pending: Vec::new() }
    }

    /// Agrega una copia del evento y hace flush si se superó el umbral.
    pub fn append(&mut self, event: &AuditEvent) -> Result<(), BufferError<B::Error>> {
        self.pending.push(event.clone());
        if self.pending.len() > self.buffer_size {
            debug!("append:threshold pending={} buffer_size={}", self.pending.len(), self.buffer_size);
            self.flush()?;
        }
        Ok(())
    }

    /// Atajo que serializa el payload (validándolo) y lo agrega.
    pub fn record<T: Serialize + ?Sized>(&mut self,
                                         entity_id: impl Into<String>,
                                         entity_type: impl Into<String>,
                                         entity_data: &T,
                                         event_moment: DateTime<Utc>)
                                         -> Result<(), BufferError<B::Error>> {
        let event = AuditEvent::from_serializable(entity_id, entity_type, entity_data, event_moment)?;
        self.append(&event)
    }

    /// Entrega el contenido al backend. Con el buffer vacío no hace nada.
    pub fn flush(&mut self) -> Result<(), BufferError<B::Error>> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        debug!("flush:start count={}", batch.len());
        self.backend.load_batch(&batch).map_err(BufferError::Backend)?;
        debug!("flush:done count={}", batch.len());
        Ok(())
    }

    /// Flush final y devolución del backend.
    pub fn finish(mut self) -> Result<B, BufferError<B::Error>> {
        self.flush()?;
        Ok(self.backend)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
