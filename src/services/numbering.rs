// src/services/numbering.rs

use std::sync::Arc;

use chrono::Utc;

// Números de lote e de referência são gerados a partir do relógio quando o
// chamador não informa um. A geração fica atrás de um trait para os testes
// poderem injetar valores determinísticos.
pub trait NumberGenerator: Send + Sync {
    fn lot_number(&self) -> String;
    fn reference(&self, prefix: &str) -> String;
}

pub type SharedNumberGenerator = Arc<dyn NumberGenerator>;

/// Gerador de produção: baseado no timestamp em milissegundos.
pub struct SystemNumberGenerator;

impl NumberGenerator for SystemNumberGenerator {
    fn lot_number(&self) -> String {
        format!("LOT-{}", Utc::now().timestamp_millis())
    }

    fn reference(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
pub struct FixedNumberGenerator(pub &'static str);

#[cfg(test)]
impl NumberGenerator for FixedNumberGenerator {
    fn lot_number(&self) -> String {
        format!("LOT-{}", self.0)
    }

    fn reference(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.0)
    }
}
