// src/models/stock.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- 1. Status do Lote ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lot_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum LotStatus {
    Active,
    Expired,
    Depleted,
    Cancelled,
}

// --- 2. Lote de Estoque ---
// Um lote é um recebimento rastreável de um produto em (armazém, posição),
// com validade própria e o seu próprio livro-razão de quantidades.
// Invariantes: 0 <= reserved <= current, available = current - reserved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLot {
    pub id: Uuid,
    pub lot_number: String,
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_batch_number: Option<String>,
    pub initial_quantity: i32,
    pub current_quantity: i32,
    pub reserved_quantity: i32,
    pub available_quantity: i32,
    pub status: LotStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StockLot {
    // Recalcula a quantidade disponível após qualquer mutação.
    fn recompute_available(&mut self) {
        self.available_quantity = self.current_quantity - self.reserved_quantity;
        self.updated_at = Some(Utc::now());
    }

    /// Um número de lote pertence para sempre a um único
    /// (produto, armazém, posição); este é o teste de pertencimento.
    pub fn same_context(
        &self,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> bool {
        self.product_unit_id == product_unit_id
            && self.warehouse_id == warehouse_id
            && self.stock_location_id == stock_location_id
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry < today)
    }

    pub fn is_near_expiry(&self, today: NaiveDate, days: i64) -> bool {
        match self.expiry_date {
            Some(expiry) => expiry <= today + chrono::Duration::days(days) && expiry >= today,
            None => false,
        }
    }

    /// Reserva `quantity` unidades deste lote (aumenta o reservado,
    /// sem tocar na quantidade física).
    pub fn reserve(&mut self, quantity: i32) -> Result<(), AppError> {
        if self.status != LotStatus::Active {
            return Err(AppError::LotNotActive {
                lot_number: self.lot_number.clone(),
                status: self.status,
            });
        }
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a reservar deve ser positiva (recebido {quantity})"
            )));
        }
        if self.available_quantity < quantity {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: self.available_quantity,
                product_unit_id: self.product_unit_id,
            });
        }
        self.reserved_quantity += quantity;
        self.recompute_available();
        Ok(())
    }

    /// Libera uma reserva feita anteriormente.
    pub fn release(&mut self, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a liberar deve ser positiva (recebido {quantity})"
            )));
        }
        if self.reserved_quantity < quantity {
            return Err(AppError::InvalidQuantity(format!(
                "não é possível liberar {quantity} unidades do lote '{}': apenas {} reservadas",
                self.lot_number, self.reserved_quantity
            )));
        }
        self.reserved_quantity -= quantity;
        self.recompute_available();
        Ok(())
    }

    /// Consome unidades reservadas: baixa física e reservada juntas.
    /// Quando a quantidade física chega a zero o lote passa a DEPLETED.
    pub fn consume(&mut self, quantity: i32) -> Result<(), AppError> {
        if self.status != LotStatus::Active {
            return Err(AppError::LotNotActive {
                lot_number: self.lot_number.clone(),
                status: self.status,
            });
        }
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a consumir deve ser positiva (recebido {quantity})"
            )));
        }
        if self.reserved_quantity < quantity {
            return Err(AppError::InvalidQuantity(format!(
                "o lote '{}' tem apenas {} unidades reservadas (consumo de {quantity})",
                self.lot_number, self.reserved_quantity
            )));
        }
        if self.current_quantity < quantity {
            return Err(AppError::InvalidQuantity(format!(
                "o lote '{}' tem apenas {} unidades físicas (consumo de {quantity})",
                self.lot_number, self.current_quantity
            )));
        }
        self.current_quantity -= quantity;
        self.reserved_quantity -= quantity;
        self.recompute_available();
        if self.current_quantity == 0 {
            self.status = LotStatus::Depleted;
        }
        Ok(())
    }

    /// Baixa direta (saída sem reserva prévia): consome unidades ainda
    /// disponíveis, respeitando o que está reservado para outros.
    pub fn withdraw(&mut self, quantity: i32) -> Result<(), AppError> {
        if self.status != LotStatus::Active {
            return Err(AppError::LotNotActive {
                lot_number: self.lot_number.clone(),
                status: self.status,
            });
        }
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a baixar deve ser positiva (recebido {quantity})"
            )));
        }
        if self.available_quantity < quantity {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: self.available_quantity,
                product_unit_id: self.product_unit_id,
            });
        }
        self.current_quantity -= quantity;
        self.recompute_available();
        if self.current_quantity == 0 {
            self.status = LotStatus::Depleted;
        }
        Ok(())
    }

    /// Acumula uma nova entrada no mesmo lote (mesmo número, mesmo contexto):
    /// soma na física e na inicial, e sobrescreve os campos descritivos
    /// apenas se vierem preenchidos.
    pub fn merge_inbound(
        &mut self,
        quantity: i32,
        expiry_date: Option<NaiveDate>,
        manufacturing_date: Option<NaiveDate>,
        supplier_name: Option<String>,
        supplier_batch_number: Option<String>,
        note: Option<String>,
    ) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade de entrada deve ser positiva (recebido {quantity})"
            )));
        }
        self.current_quantity += quantity;
        self.initial_quantity += quantity;
        if expiry_date.is_some() {
            self.expiry_date = expiry_date;
        }
        if manufacturing_date.is_some() {
            self.manufacturing_date = manufacturing_date;
        }
        if supplier_name.is_some() {
            self.supplier_name = supplier_name;
        }
        if supplier_batch_number.is_some() {
            self.supplier_batch_number = supplier_batch_number;
        }
        if note.is_some() {
            self.note = note;
        }
        // Uma nova entrada reativa um lote esgotado.
        if self.status == LotStatus::Depleted {
            self.status = LotStatus::Active;
        }
        self.recompute_available();
        Ok(())
    }
}

// --- 3. Saldo de Estoque ---
// Projeção agregada por (produto, armazém, posição). Os lotes são a fonte
// da verdade para FEFO/validade; o saldo existe para consultas rápidas e
// precisa andar em sincronia com a soma dos lotes, dentro da mesma transação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockBalance {
    pub id: Uuid,
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub available_quantity: i32,
    pub last_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl StockBalance {
    fn recompute_available(&mut self) {
        self.available_quantity = self.quantity - self.reserved_quantity;
        self.last_updated_at = Utc::now();
    }

    /// IMPORT: soma unidades físicas.
    pub fn apply_import(&mut self, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade de importação deve ser positiva (recebido {quantity})"
            )));
        }
        self.quantity += quantity;
        self.recompute_available();
        Ok(())
    }

    /// EXPORT: baixa unidades físicas não reservadas.
    pub fn apply_export(&mut self, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade de exportação deve ser positiva (recebido {quantity})"
            )));
        }
        if self.available_quantity < quantity {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: self.available_quantity,
                product_unit_id: self.product_unit_id,
            });
        }
        self.quantity -= quantity;
        self.recompute_available();
        Ok(())
    }

    /// ADJUST: correção de contagem — valor absoluto, não delta.
    pub fn apply_adjust(&mut self, new_quantity: i32) -> Result<(), AppError> {
        if new_quantity < 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade ajustada não pode ser negativa (recebido {new_quantity})"
            )));
        }
        if new_quantity < self.reserved_quantity {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade ajustada ({new_quantity}) é menor que o reservado ({})",
                self.reserved_quantity
            )));
        }
        self.quantity = new_quantity;
        self.recompute_available();
        Ok(())
    }

    /// Reserva no agregado: mexe só no reservado, nunca na física.
    pub fn reserve(&mut self, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a reservar deve ser positiva (recebido {quantity})"
            )));
        }
        if self.available_quantity < quantity {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: self.available_quantity,
                product_unit_id: self.product_unit_id,
            });
        }
        self.reserved_quantity += quantity;
        self.recompute_available();
        Ok(())
    }

    /// Libera reserva no agregado.
    pub fn release(&mut self, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a liberar deve ser positiva (recebido {quantity})"
            )));
        }
        if self.reserved_quantity < quantity {
            return Err(AppError::InvalidQuantity(format!(
                "não é possível liberar {quantity} unidades: apenas {} reservadas no saldo",
                self.reserved_quantity
            )));
        }
        self.reserved_quantity -= quantity;
        self.recompute_available();
        Ok(())
    }

    /// Consumo de reserva no agregado: baixa física e reservada juntas.
    pub fn consume(&mut self, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a consumir deve ser positiva (recebido {quantity})"
            )));
        }
        if self.reserved_quantity < quantity {
            return Err(AppError::InvalidQuantity(format!(
                "o saldo tem apenas {} unidades reservadas (consumo de {quantity})",
                self.reserved_quantity
            )));
        }
        self.quantity -= quantity;
        self.reserved_quantity -= quantity;
        self.recompute_available();
        Ok(())
    }
}

// --- 4. Transações de Estoque (livro-razão de movimentações) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Import,
    Export,
    Adjust,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub quantity: i32,
    pub transaction_date: DateTime<Utc>,
    pub note: Option<String>,
    pub reference_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_lot(current: i32, reserved: i32, expiry: Option<NaiveDate>) -> StockLot {
        StockLot {
            id: Uuid::new_v4(),
            lot_number: "LOT-001".to_string(),
            product_unit_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            stock_location_id: Uuid::new_v4(),
            expiry_date: expiry,
            manufacturing_date: None,
            supplier_name: None,
            supplier_batch_number: None,
            initial_quantity: current,
            current_quantity: current,
            reserved_quantity: reserved,
            available_quantity: current - reserved,
            status: LotStatus::Active,
            note: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn make_balance(quantity: i32, reserved: i32) -> StockBalance {
        StockBalance {
            id: Uuid::new_v4(),
            product_unit_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            stock_location_id: Uuid::new_v4(),
            quantity,
            reserved_quantity: reserved,
            available_quantity: quantity - reserved,
            last_updated_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn numero_de_lote_pertence_a_um_unico_contexto() {
        let lot = make_lot(10, 0, None);
        assert!(lot.same_context(
            lot.product_unit_id,
            lot.warehouse_id,
            lot.stock_location_id
        ));
        // Qualquer perna do contexto diferente -> outro contexto.
        assert!(!lot.same_context(Uuid::new_v4(), lot.warehouse_id, lot.stock_location_id));
        assert!(!lot.same_context(lot.product_unit_id, Uuid::new_v4(), lot.stock_location_id));
        assert!(!lot.same_context(lot.product_unit_id, lot.warehouse_id, Uuid::new_v4()));
    }

    #[test]
    fn lot_reserve_mantem_invariantes() {
        let mut lot = make_lot(10, 0, None);
        lot.reserve(4).unwrap();
        assert_eq!(lot.current_quantity, 10);
        assert_eq!(lot.reserved_quantity, 4);
        assert_eq!(lot.available_quantity, 6);
    }

    #[test]
    fn lot_reserve_acima_do_disponivel_falha() {
        let mut lot = make_lot(10, 8, None);
        let err = lot.reserve(3).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        // Nada mudou.
        assert_eq!(lot.reserved_quantity, 8);
        assert_eq!(lot.available_quantity, 2);
    }

    #[test]
    fn lot_reserve_em_lote_inativo_falha() {
        let mut lot = make_lot(10, 0, None);
        lot.status = LotStatus::Cancelled;
        assert!(matches!(
            lot.reserve(1).unwrap_err(),
            AppError::LotNotActive { .. }
        ));
    }

    #[test]
    fn lot_release_restaura_disponivel() {
        let mut lot = make_lot(10, 6, None);
        lot.release(6).unwrap();
        assert_eq!(lot.reserved_quantity, 0);
        assert_eq!(lot.available_quantity, 10);
        assert_eq!(lot.current_quantity, 10);
    }

    #[test]
    fn lot_release_acima_do_reservado_falha() {
        let mut lot = make_lot(10, 2, None);
        assert!(matches!(
            lot.release(3).unwrap_err(),
            AppError::InvalidQuantity(_)
        ));
        assert_eq!(lot.reserved_quantity, 2);
    }

    #[test]
    fn lot_consume_baixa_fisica_e_reservada() {
        let mut lot = make_lot(10, 4, None);
        lot.consume(4).unwrap();
        assert_eq!(lot.current_quantity, 6);
        assert_eq!(lot.reserved_quantity, 0);
        assert_eq!(lot.available_quantity, 6);
        assert_eq!(lot.status, LotStatus::Active);
    }

    #[test]
    fn lot_consume_total_esgota_o_lote() {
        let mut lot = make_lot(5, 5, None);
        lot.consume(5).unwrap();
        assert_eq!(lot.current_quantity, 0);
        assert_eq!(lot.status, LotStatus::Depleted);
    }

    #[test]
    fn lot_consume_sem_reserva_falha() {
        let mut lot = make_lot(10, 2, None);
        assert!(matches!(
            lot.consume(5).unwrap_err(),
            AppError::InvalidQuantity(_)
        ));
    }

    #[test]
    fn lot_withdraw_respeita_reservas_de_terceiros() {
        let mut lot = make_lot(10, 4, None);
        lot.withdraw(6).unwrap();
        assert_eq!(lot.current_quantity, 4);
        assert_eq!(lot.reserved_quantity, 4);
        assert_eq!(lot.available_quantity, 0);

        // O que sobrou está todo reservado: nova baixa direta falha.
        assert!(matches!(
            lot.withdraw(1).unwrap_err(),
            AppError::InsufficientStock { .. }
        ));
    }

    #[test]
    fn lot_merge_inbound_acumula_e_reativa() {
        let mut lot = make_lot(5, 5, None);
        lot.consume(5).unwrap();
        assert_eq!(lot.status, LotStatus::Depleted);

        lot.merge_inbound(7, Some(date("2025-12-01")), None, None, None, None)
            .unwrap();
        assert_eq!(lot.current_quantity, 7);
        assert_eq!(lot.initial_quantity, 12);
        assert_eq!(lot.expiry_date, Some(date("2025-12-01")));
        assert_eq!(lot.status, LotStatus::Active);
    }

    #[test]
    fn lot_validade_proxima_e_vencida() {
        let today = date("2024-06-10");
        let lot = make_lot(1, 0, Some(date("2024-06-15")));
        assert!(lot.is_near_expiry(today, 7));
        assert!(!lot.is_near_expiry(today, 2));
        assert!(!lot.is_expired(today));

        let vencido = make_lot(1, 0, Some(date("2024-06-01")));
        assert!(vencido.is_expired(today));

        let sem_validade = make_lot(1, 0, None);
        assert!(!sem_validade.is_near_expiry(today, 365));
        assert!(!sem_validade.is_expired(today));
    }

    #[test]
    fn balance_import_export_adjust() {
        let mut balance = make_balance(0, 0);
        balance.apply_import(20).unwrap();
        assert_eq!(balance.quantity, 20);
        assert_eq!(balance.available_quantity, 20);

        balance.apply_export(5).unwrap();
        assert_eq!(balance.quantity, 15);

        balance.apply_adjust(8).unwrap();
        assert_eq!(balance.quantity, 8);
        assert_eq!(balance.available_quantity, 8);
    }

    #[test]
    fn balance_export_acima_do_disponivel_falha() {
        let mut balance = make_balance(10, 4);
        let err = balance.apply_export(7).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock {
                requested: 7,
                available: 6,
                ..
            }
        ));
        assert_eq!(balance.quantity, 10);
    }

    #[test]
    fn balance_adjust_abaixo_do_reservado_falha() {
        let mut balance = make_balance(10, 4);
        assert!(matches!(
            balance.apply_adjust(3).unwrap_err(),
            AppError::InvalidQuantity(_)
        ));
    }

    #[test]
    fn balance_reserve_consume_zera_reserva() {
        let mut balance = make_balance(15, 0);
        balance.reserve(8).unwrap();
        assert_eq!(balance.reserved_quantity, 8);
        assert_eq!(balance.available_quantity, 7);

        balance.consume(8).unwrap();
        assert_eq!(balance.quantity, 7);
        assert_eq!(balance.reserved_quantity, 0);
        assert_eq!(balance.available_quantity, 7);
    }

    #[test]
    fn balance_release_restaura_estado() {
        let mut balance = make_balance(15, 0);
        balance.reserve(8).unwrap();
        balance.release(8).unwrap();
        assert_eq!(balance.quantity, 15);
        assert_eq!(balance.reserved_quantity, 0);
        assert_eq!(balance.available_quantity, 15);
    }
}
