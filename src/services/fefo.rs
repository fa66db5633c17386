// src/services/fefo.rs

use std::cmp::Ordering;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::document::LotReservation;
use crate::models::stock::{LotStatus, StockLot};

// First-Expire-First-Out: o estoque que vence primeiro sai primeiro.
// Lotes sem validade vão para o fim da fila; empate é decidido pela data de
// criação (estoque mais antigo primeiro). Esta é a ÚNICA definição da ordem
// FEFO no sistema — as queries de candidatos apenas filtram.
pub fn fefo_ordering(a: &StockLot, b: &StockLot) -> Ordering {
    match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.created_at.cmp(&b.created_at)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    }
}

/// Monta o plano de alocação FEFO para `required_quantity` unidades sobre os
/// lotes candidatos. Guloso: caminha na ordem FEFO tirando
/// `min(restante, disponível)` de cada lote.
///
/// Tudo ou nada: se a soma disponível dos candidatos não cobre o pedido,
/// falha sem alocar parcialmente. Pedido não positivo devolve um plano vazio.
pub fn allocate(
    candidates: &[StockLot],
    required_quantity: i32,
    product_unit_id: Uuid,
) -> Result<Vec<LotReservation>, AppError> {
    if required_quantity <= 0 {
        return Ok(Vec::new());
    }

    let mut lots: Vec<&StockLot> = candidates
        .iter()
        .filter(|l| l.status == LotStatus::Active && l.available_quantity > 0)
        .collect();
    lots.sort_by(|a, b| fefo_ordering(a, b));

    let total_available: i32 = lots.iter().map(|l| l.available_quantity).sum();
    if total_available < required_quantity {
        return Err(AppError::InsufficientStock {
            requested: required_quantity,
            available: total_available,
            product_unit_id,
        });
    }

    let mut plan = Vec::new();
    let mut remaining = required_quantity;
    for lot in lots {
        if remaining == 0 {
            break;
        }
        let to_take = remaining.min(lot.available_quantity);
        plan.push(LotReservation {
            lot_id: lot.id,
            lot_number: lot.lot_number.clone(),
            reserved_quantity: to_take,
        });
        remaining -= to_take;
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn lot(
        number: &str,
        expiry: Option<&str>,
        available: i32,
        created_at: DateTime<Utc>,
        product: Uuid,
    ) -> StockLot {
        StockLot {
            id: Uuid::new_v4(),
            lot_number: number.to_string(),
            product_unit_id: product,
            warehouse_id: Uuid::new_v4(),
            stock_location_id: Uuid::new_v4(),
            expiry_date: expiry.map(|e| e.parse::<NaiveDate>().unwrap()),
            manufacturing_date: None,
            supplier_name: None,
            supplier_batch_number: None,
            initial_quantity: available,
            current_quantity: available,
            reserved_quantity: 0,
            available_quantity: available,
            status: LotStatus::Active,
            note: None,
            created_at,
            updated_at: None,
        }
    }

    fn ts(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
    }

    #[test]
    fn ordena_por_validade_com_nulos_no_fim() {
        let product = Uuid::new_v4();
        // Cadastrados fora de ordem de propósito.
        let lots = vec![
            lot("L1", Some("2024-01-01"), 1, ts(0), product),
            lot("L2", None, 1, ts(1), product),
            lot("L3", Some("2023-06-01"), 1, ts(2), product),
        ];

        let plan = allocate(&lots, 3, product).unwrap();
        let numbers: Vec<&str> = plan.iter().map(|p| p.lot_number.as_str()).collect();
        assert_eq!(numbers, vec!["L3", "L1", "L2"]);
    }

    #[test]
    fn empate_de_validade_decide_pelo_mais_antigo() {
        let product = Uuid::new_v4();
        let lots = vec![
            lot("NOVO", Some("2024-01-01"), 1, ts(100), product),
            lot("ANTIGO", Some("2024-01-01"), 1, ts(1), product),
        ];

        let plan = allocate(&lots, 2, product).unwrap();
        assert_eq!(plan[0].lot_number, "ANTIGO");
        assert_eq!(plan[1].lot_number, "NOVO");
    }

    #[test]
    fn guloso_divide_entre_lotes_na_ordem() {
        let product = Uuid::new_v4();
        // Cenário de referência: A (validade, 5 disp.) e B (sem validade, 10 disp.).
        let lots = vec![
            lot("B", None, 10, ts(1), product),
            lot("A", Some("2024-06-01"), 5, ts(0), product),
        ];

        let plan = allocate(&lots, 8, product).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].lot_number, "A");
        assert_eq!(plan[0].reserved_quantity, 5);
        assert_eq!(plan[1].lot_number, "B");
        assert_eq!(plan[1].reserved_quantity, 3);
    }

    #[test]
    fn pedido_acima_do_total_nao_aloca_nada() {
        let product = Uuid::new_v4();
        let lots = vec![
            lot("A", Some("2024-06-01"), 5, ts(0), product),
            lot("B", None, 10, ts(1), product),
        ];

        let err = allocate(&lots, 20, product).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock {
                requested: 20,
                available: 15,
                ..
            }
        ));
    }

    #[test]
    fn pedido_nao_positivo_vira_plano_vazio() {
        let product = Uuid::new_v4();
        let lots = vec![lot("A", None, 5, ts(0), product)];
        assert!(allocate(&lots, 0, product).unwrap().is_empty());
        assert!(allocate(&lots, -3, product).unwrap().is_empty());
    }

    #[test]
    fn ignora_lotes_inativos_ou_sem_disponibilidade() {
        let product = Uuid::new_v4();
        let mut cancelado = lot("CANC", Some("2023-01-01"), 5, ts(0), product);
        cancelado.status = LotStatus::Cancelled;
        let mut reservado = lot("RESV", Some("2023-02-01"), 5, ts(1), product);
        reservado.reserved_quantity = 5;
        reservado.available_quantity = 0;
        let ativo = lot("ATIVO", Some("2024-01-01"), 5, ts(2), product);

        let plan = allocate(&[cancelado, reservado, ativo], 5, product).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].lot_number, "ATIVO");
    }
}
