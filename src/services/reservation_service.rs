// src/services/reservation_service.rs

use serde::Serialize;
use sqlx::{Acquire, Executor, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BalanceRepository, LotRepository},
    models::document::LotReservation,
    services::fefo,
};

// Coordenador de reservas: mantém o saldo agregado e cada lote tocado em
// acordo, ou falha a operação inteira. Cada operação roda como UMA unidade
// transacional com a linha do saldo (e os lotes tocados) travados até o
// commit — a linha do saldo é o ponto de serialização de todas as tentativas
// de reserva sobre o mesmo (produto, armazém, posição).
#[derive(Clone)]
pub struct ReservationService {
    lot_repo: LotRepository,
    balance_repo: BalanceRepository,
}

/// Resultado da reserva: o recibo é a lista ordenada de reservas por lote,
/// persistida pelo fluxo de documentos e usada sem alterações no consumo
/// ou na liberação.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReserveResult {
    pub total_reserved: i32,
    pub lot_reservations: Vec<LotReservation>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeResult {
    pub total_consumed: i32,
    pub consumed_from_lots: i32,
}

/// Fotografia da disponibilidade: o agregado e a soma independente dos
/// lotes, lado a lado, para o chamador montar uma mensagem de falta precisa.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuantityInfo {
    pub available_from_balance: i32,
    pub available_from_lots: i32,
    pub number_of_lots: usize,
}

impl ReservationService {
    pub fn new(lot_repo: LotRepository, balance_repo: BalanceRepository) -> Self {
        Self {
            lot_repo,
            balance_repo,
        }
    }

    /// Reserva `quantity` unidades no contexto, escolhendo lotes por FEFO.
    ///
    /// A suficiência é confirmada DUAS vezes: no saldo agregado e na soma
    /// dos lotes. Os dois são mantidos por caminhos de código separados;
    /// sem a dupla checagem, uma divergência passaria despercebida.
    pub async fn reserve_stock<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
    ) -> Result<ReserveResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a reservar deve ser positiva (recebido {quantity})"
            )));
        }

        let mut tx = executor.begin().await?;

        // 1. Checagem no agregado, com a linha travada.
        let mut balance = self
            .balance_repo
            .find_by_triple_for_update(&mut *tx, product_unit_id, warehouse_id, stock_location_id)
            .await?
            .ok_or(AppError::StockBalanceNotFound {
                product_unit_id,
                warehouse_id,
                stock_location_id,
            })?;

        if balance.available_quantity < quantity {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: balance.available_quantity,
                product_unit_id,
            });
        }

        // 2. Checagem independente na soma dos lotes + plano FEFO.
        //    O alocador falha por inteiro se os lotes não cobrem o pedido.
        let mut lots = self
            .lot_repo
            .find_available_for_fefo_for_update(
                &mut *tx,
                product_unit_id,
                warehouse_id,
                stock_location_id,
            )
            .await?;
        let plan = fefo::allocate(&lots, quantity, product_unit_id)?;

        // 3. Reserva lote a lote, na ordem do plano.
        for entry in &plan {
            let lot = lots
                .iter_mut()
                .find(|l| l.id == entry.lot_id)
                .ok_or(AppError::LotNotFound(entry.lot_id))?;
            lot.reserve(entry.reserved_quantity)?;
            self.lot_repo.save(&mut *tx, lot).await?;
            tracing::info!(
                "Reservadas {} unidades do lote '{}' ({})",
                entry.reserved_quantity,
                entry.lot_number,
                entry.lot_id
            );
        }

        // 4. Espelha a reserva no agregado.
        balance.reserve(quantity)?;
        self.balance_repo.save(&mut *tx, &balance).await?;

        tx.commit().await?;

        tracing::info!(
            "Reservadas {} unidades no saldo (produto {}, armazém {}, posição {})",
            quantity,
            product_unit_id,
            warehouse_id,
            stock_location_id
        );

        Ok(ReserveResult {
            total_reserved: quantity,
            lot_reservations: plan,
        })
    }

    /// Consome uma reserva na aprovação do documento, guiado EXCLUSIVAMENTE
    /// pelo recibo gravado na reserva — nunca refaz a alocação, para não
    /// decidir sobre um estoque que já mudou desde então.
    ///
    /// Não é idempotente por desenho: consumir duas vezes baixa duas vezes.
    /// O chamador garante exatamente-uma-vez via transição DRAFT -> APPROVED.
    pub async fn consume_reserved_stock<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
        receipt: &[LotReservation],
    ) -> Result<ConsumeResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade a consumir deve ser positiva (recebido {quantity})"
            )));
        }

        let mut tx = executor.begin().await?;

        // 1. Consumo lote a lote, conforme o recibo.
        let mut consumed_from_lots = 0;
        for entry in receipt {
            let mut lot = self
                .lot_repo
                .find_by_id_for_update(&mut *tx, entry.lot_id)
                .await?
                .ok_or(AppError::LotNotFound(entry.lot_id))?;
            lot.consume(entry.reserved_quantity)?;
            self.lot_repo.save(&mut *tx, &lot).await?;
            consumed_from_lots += entry.reserved_quantity;

            tracing::info!(
                "Consumidas {} unidades do lote '{}' ({})",
                entry.reserved_quantity,
                entry.lot_number,
                entry.lot_id
            );
        }

        // 2. Espelha no agregado: baixa física e reservada juntas.
        let mut balance = self
            .balance_repo
            .find_by_triple_for_update(&mut *tx, product_unit_id, warehouse_id, stock_location_id)
            .await?
            .ok_or(AppError::StockBalanceNotFound {
                product_unit_id,
                warehouse_id,
                stock_location_id,
            })?;
        balance.consume(quantity)?;
        self.balance_repo.save(&mut *tx, &balance).await?;

        tx.commit().await?;

        tracing::info!(
            "Consumidas {} unidades do saldo (produto {}, armazém {}, posição {})",
            quantity,
            product_unit_id,
            warehouse_id,
            stock_location_id
        );

        Ok(ConsumeResult {
            total_consumed: quantity,
            consumed_from_lots,
        })
    }

    /// Libera uma reserva no cancelamento do documento. A quantidade física
    /// não muda em lugar nenhum — nada saiu do estoque.
    pub async fn release_reservation<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
        receipt: &[LotReservation],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        for entry in receipt {
            let mut lot = self
                .lot_repo
                .find_by_id_for_update(&mut *tx, entry.lot_id)
                .await?
                .ok_or(AppError::LotNotFound(entry.lot_id))?;
            lot.release(entry.reserved_quantity)?;
            self.lot_repo.save(&mut *tx, &lot).await?;

            tracing::info!(
                "Liberadas {} unidades do lote '{}' ({})",
                entry.reserved_quantity,
                entry.lot_number,
                entry.lot_id
            );
        }

        let mut balance = self
            .balance_repo
            .find_by_triple_for_update(&mut *tx, product_unit_id, warehouse_id, stock_location_id)
            .await?
            .ok_or(AppError::StockBalanceNotFound {
                product_unit_id,
                warehouse_id,
                stock_location_id,
            })?;
        balance.release(quantity)?;
        self.balance_repo.save(&mut *tx, &balance).await?;

        tx.commit().await?;

        tracing::info!(
            "Liberadas {} unidades no saldo (produto {}, armazém {}, posição {})",
            quantity,
            product_unit_id,
            warehouse_id,
            stock_location_id
        );
        Ok(())
    }

    // ---
    // Sondas de leitura (consultivas)
    // ---
    // O resultado é apenas orientativo: a checagem que vale é refeita dentro
    // da transação travada da reserva.

    pub async fn check_available_quantity<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        required_quantity: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let info = self
            .get_available_quantity_info(executor, product_unit_id, warehouse_id, stock_location_id)
            .await?;
        Ok(info.available_from_balance >= required_quantity
            && info.available_from_lots >= required_quantity)
    }

    pub async fn get_available_quantity_info<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<AvailableQuantityInfo, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.begin().await?;

        let balance = self
            .balance_repo
            .find_by_triple(&mut *conn, product_unit_id, warehouse_id, stock_location_id)
            .await?;
        let available_from_balance = balance.map(|b| b.available_quantity).unwrap_or(0);

        let lots = self
            .lot_repo
            .find_available_for_fefo(&mut *conn, product_unit_id, warehouse_id, stock_location_id)
            .await?;
        let available_from_lots = lots.iter().map(|l| l.available_quantity).sum();

        Ok(AvailableQuantityInfo {
            available_from_balance,
            available_from_lots,
            number_of_lots: lots.len(),
        })
    }
}

// Os cenários abaixo exercitam a álgebra completa de reserva/consumo/
// liberação sobre lotes e saldo em memória — a mesma sequência de mutações
// que os métodos acima aplicam dentro da transação.
#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::common::error::AppError;
    use crate::models::document::LotReservation;
    use crate::models::stock::{LotStatus, StockBalance, StockLot};
    use crate::services::fefo;
    use uuid::Uuid;

    struct Fixture {
        lots: Vec<StockLot>,
        balance: StockBalance,
        product: Uuid,
    }

    // Cenário de referência: lote A (validade 2024-06-01, 5 un.) e lote B
    // (sem validade, 10 un.); saldo 15/0/15.
    fn fixture() -> Fixture {
        let product = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let location = Uuid::new_v4();

        let lot = |number: &str, expiry: Option<&str>, qty: i32, secs: i64| StockLot {
            id: Uuid::new_v4(),
            lot_number: number.to_string(),
            product_unit_id: product,
            warehouse_id: warehouse,
            stock_location_id: location,
            expiry_date: expiry.map(|e| e.parse::<NaiveDate>().unwrap()),
            manufacturing_date: None,
            supplier_name: None,
            supplier_batch_number: None,
            initial_quantity: qty,
            current_quantity: qty,
            reserved_quantity: 0,
            available_quantity: qty,
            status: LotStatus::Active,
            note: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            updated_at: None,
        };

        Fixture {
            lots: vec![
                lot("A", Some("2024-06-01"), 5, 0),
                lot("B", None, 10, 1),
            ],
            balance: StockBalance {
                id: Uuid::new_v4(),
                product_unit_id: product,
                warehouse_id: warehouse,
                stock_location_id: location,
                quantity: 15,
                reserved_quantity: 0,
                available_quantity: 15,
                last_updated_at: Utc::now(),
                created_at: Utc::now(),
            },
            product,
        }
    }

    // Reproduz reserve_stock: checagem no saldo, plano FEFO, reserva por
    // lote e espelho no agregado.
    fn reserve(fx: &mut Fixture, quantity: i32) -> Result<Vec<LotReservation>, AppError> {
        if fx.balance.available_quantity < quantity {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: fx.balance.available_quantity,
                product_unit_id: fx.product,
            });
        }
        let plan = fefo::allocate(&fx.lots, quantity, fx.product)?;
        for entry in &plan {
            let lot = fx.lots.iter_mut().find(|l| l.id == entry.lot_id).unwrap();
            lot.reserve(entry.reserved_quantity)?;
        }
        fx.balance.reserve(quantity)?;
        Ok(plan)
    }

    fn consume(fx: &mut Fixture, quantity: i32, receipt: &[LotReservation]) {
        for entry in receipt {
            let lot = fx.lots.iter_mut().find(|l| l.id == entry.lot_id).unwrap();
            lot.consume(entry.reserved_quantity).unwrap();
        }
        fx.balance.consume(quantity).unwrap();
    }

    fn release(fx: &mut Fixture, quantity: i32, receipt: &[LotReservation]) {
        for entry in receipt {
            let lot = fx.lots.iter_mut().find(|l| l.id == entry.lot_id).unwrap();
            lot.release(entry.reserved_quantity).unwrap();
        }
        fx.balance.release(quantity).unwrap();
    }

    #[test]
    fn reserva_de_8_divide_5_e_3_entre_os_lotes() {
        let mut fx = fixture();
        let receipt = reserve(&mut fx, 8).unwrap();

        assert_eq!(receipt.len(), 2);
        assert_eq!(receipt[0].lot_number, "A");
        assert_eq!(receipt[0].reserved_quantity, 5);
        assert_eq!(receipt[1].lot_number, "B");
        assert_eq!(receipt[1].reserved_quantity, 3);

        let a = &fx.lots[0];
        assert_eq!((a.reserved_quantity, a.available_quantity), (5, 0));
        let b = &fx.lots[1];
        assert_eq!((b.reserved_quantity, b.available_quantity), (3, 7));
        assert_eq!(fx.balance.reserved_quantity, 8);
        assert_eq!(fx.balance.available_quantity, 7);
    }

    #[test]
    fn reserva_de_20_falha_sem_tocar_em_nada() {
        let mut fx = fixture();
        let err = reserve(&mut fx, 20).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        for lot in &fx.lots {
            assert_eq!(lot.reserved_quantity, 0);
        }
        assert_eq!(fx.balance.reserved_quantity, 0);
        assert_eq!(fx.balance.available_quantity, 15);
    }

    #[test]
    fn reservar_e_consumir_baixa_fisica_e_zera_reserva() {
        let mut fx = fixture();
        let receipt = reserve(&mut fx, 8).unwrap();
        consume(&mut fx, 8, &receipt);

        // Lote A consumido por inteiro -> esgotado.
        let a = &fx.lots[0];
        assert_eq!(a.current_quantity, 0);
        assert_eq!(a.reserved_quantity, 0);
        assert_eq!(a.status, LotStatus::Depleted);

        let b = &fx.lots[1];
        assert_eq!(b.current_quantity, 7);
        assert_eq!(b.reserved_quantity, 0);
        assert_eq!(b.available_quantity, 7);

        assert_eq!(fx.balance.quantity, 7);
        assert_eq!(fx.balance.reserved_quantity, 0);
        assert_eq!(fx.balance.available_quantity, 7);
    }

    #[test]
    fn reservar_e_liberar_restaura_o_estado_original() {
        let mut fx = fixture();
        let receipt = reserve(&mut fx, 8).unwrap();
        release(&mut fx, 8, &receipt);

        for lot in &fx.lots {
            assert_eq!(lot.reserved_quantity, 0);
            assert_eq!(lot.available_quantity, lot.current_quantity);
        }
        assert_eq!(fx.lots[0].current_quantity, 5);
        assert_eq!(fx.lots[1].current_quantity, 10);
        assert_eq!(fx.balance.quantity, 15);
        assert_eq!(fx.balance.reserved_quantity, 0);
        assert_eq!(fx.balance.available_quantity, 15);
    }

    #[test]
    fn consumo_parcial_do_recibo_mantem_o_resto_reservado() {
        let mut fx = fixture();
        let receipt = reserve(&mut fx, 8).unwrap();

        // Consome só a fatia do lote A (primeira entrada do recibo).
        let partial: Vec<LotReservation> = receipt[..1].to_vec();
        consume(&mut fx, 5, &partial);

        assert_eq!(fx.lots[0].status, LotStatus::Depleted);
        assert_eq!(fx.lots[1].reserved_quantity, 3);
        assert_eq!(fx.balance.quantity, 10);
        assert_eq!(fx.balance.reserved_quantity, 3);
        assert_eq!(fx.balance.available_quantity, 7);
    }
}
