// src/services/lot_service.rs

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Acquire, Executor, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LotRepository,
    models::document::LotReservation,
    models::stock::{LotStatus, StockLot},
    services::{fefo, numbering::SharedNumberGenerator},
};

#[derive(Clone)]
pub struct LotService {
    lot_repo: LotRepository,
    numbers: SharedNumberGenerator,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LotStatistics {
    pub total_lots: i64,
    pub active_lots: i64,
    pub expired_lots: i64,
    pub depleted_lots: i64,
    pub cancelled_lots: i64,
}

impl LotService {
    pub fn new(lot_repo: LotRepository, numbers: SharedNumberGenerator) -> Self {
        Self { lot_repo, numbers }
    }

    /// Validação antecipada para linhas de rascunho INBOUND: o número de lote
    /// não pode estar em uso por outro (produto, armazém, posição).
    /// Número vazio é permitido — será gerado na aprovação.
    pub async fn validate_lot_number_for_inbound_draft<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        lot_number: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(number) = lot_number.filter(|n| !n.trim().is_empty()) else {
            return Ok(());
        };

        if let Some(existing) = self.lot_repo.find_by_number(executor, number).await? {
            if !existing.same_context(product_unit_id, warehouse_id, stock_location_id) {
                return Err(AppError::LotNumberConflict {
                    lot_number: number.to_string(),
                    product_unit_id: existing.product_unit_id,
                    warehouse_id: existing.warehouse_id,
                    stock_location_id: existing.stock_location_id,
                });
            }
        }
        Ok(())
    }

    /// Entrada de estoque no lote: se o número já existe no MESMO contexto,
    /// acumula; se existe em outro contexto, conflito; senão cria um lote
    /// novo (gerando o número quando não informado).
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_on_inbound<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
        lot_number: Option<&str>,
        expiry_date: Option<NaiveDate>,
        manufacturing_date: Option<NaiveDate>,
        supplier_name: Option<&str>,
        supplier_batch_number: Option<&str>,
        note: Option<&str>,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade de entrada deve ser positiva (recebido {quantity})"
            )));
        }

        let mut tx = executor.begin().await?;

        let number = match lot_number.filter(|n| !n.trim().is_empty()) {
            Some(n) => n.to_string(),
            None => self.numbers.lot_number(),
        };

        // Mesmo número + mesmo contexto -> acumula no lote existente.
        if let Some(mut existing) = self
            .lot_repo
            .find_by_number_at_for_update(
                &mut *tx,
                &number,
                product_unit_id,
                warehouse_id,
                stock_location_id,
            )
            .await?
        {
            existing.merge_inbound(
                quantity,
                expiry_date,
                manufacturing_date,
                supplier_name.map(str::to_string),
                supplier_batch_number.map(str::to_string),
                note.map(str::to_string),
            )?;
            self.lot_repo.save(&mut *tx, &existing).await?;
            tx.commit().await?;

            tracing::info!(
                "Entrada de {} unidades acumulada no lote '{}' (produto {})",
                quantity,
                existing.lot_number,
                product_unit_id
            );
            return Ok(existing);
        }

        // Número em uso em outro contexto -> conflito, sem mutação.
        if let Some(conflict) = self.lot_repo.find_by_number(&mut *tx, &number).await? {
            return Err(AppError::LotNumberConflict {
                lot_number: number,
                product_unit_id: conflict.product_unit_id,
                warehouse_id: conflict.warehouse_id,
                stock_location_id: conflict.stock_location_id,
            });
        }

        let lot = self
            .lot_repo
            .create(
                &mut *tx,
                &number,
                product_unit_id,
                warehouse_id,
                stock_location_id,
                quantity,
                expiry_date,
                manufacturing_date,
                supplier_name,
                supplier_batch_number,
                note,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Lote '{}' criado com {} unidades (produto {})",
            lot.lot_number,
            quantity,
            product_unit_id
        );
        Ok(lot)
    }

    /// Reserva unidades de um lote específico.
    pub async fn reserve<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
        quantity: i32,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut lot = self
            .lot_repo
            .find_by_id_for_update(&mut *tx, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))?;
        lot.reserve(quantity)?;
        self.lot_repo.save(&mut *tx, &lot).await?;
        tx.commit().await?;

        tracing::info!("Reservadas {} unidades do lote '{}'", quantity, lot.lot_number);
        Ok(lot)
    }

    /// Libera uma reserva de um lote específico.
    pub async fn release<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
        quantity: i32,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut lot = self
            .lot_repo
            .find_by_id_for_update(&mut *tx, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))?;
        lot.release(quantity)?;
        self.lot_repo.save(&mut *tx, &lot).await?;
        tx.commit().await?;

        tracing::info!("Liberadas {} unidades do lote '{}'", quantity, lot.lot_number);
        Ok(lot)
    }

    /// Consome unidades reservadas de um lote específico.
    pub async fn consume<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
        quantity: i32,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut lot = self
            .lot_repo
            .find_by_id_for_update(&mut *tx, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))?;
        lot.consume(quantity)?;
        self.lot_repo.save(&mut *tx, &lot).await?;
        tx.commit().await?;

        tracing::info!("Consumidas {} unidades do lote '{}'", quantity, lot.lot_number);
        Ok(lot)
    }

    /// Saída direta por FEFO (sem reserva prévia): monta o plano sobre os
    /// lotes travados e baixa cada fatia. Tudo ou nada — se a soma dos lotes
    /// não cobre o pedido, nenhum lote é tocado.
    pub async fn withdraw_fefo<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<LotReservation>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
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

        for entry in &plan {
            let lot = lots
                .iter_mut()
                .find(|l| l.id == entry.lot_id)
                .ok_or(AppError::LotNotFound(entry.lot_id))?;
            lot.withdraw(entry.reserved_quantity)?;
            self.lot_repo.save(&mut *tx, lot).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Baixa FEFO de {} unidades em {} lote(s) (produto {})",
            quantity,
            plan.len(),
            product_unit_id
        );
        Ok(plan)
    }

    // ---
    // Consultas
    // ---

    pub async fn get_by_id<'e, E>(&self, executor: E, lot_id: Uuid) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.lot_repo
            .find_by_id(executor, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))
    }

    pub async fn get_by_number<'e, E>(
        &self,
        executor: E,
        lot_number: &str,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.lot_repo
            .find_by_number(executor, lot_number)
            .await?
            .ok_or_else(|| AppError::LotNumberNotFound(lot_number.to_string()))
    }

    pub async fn lots_by_triple(
        &self,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError> {
        self.lot_repo
            .find_by_triple_and_status(
                product_unit_id,
                warehouse_id,
                stock_location_id,
                LotStatus::Active,
            )
            .await
    }

    /// Candidatos FEFO no escopo pedido: os dois lados opcionais controlam
    /// o recorte (contexto exato, por armazém, por posição, ou global).
    pub async fn available_lots_scoped<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Option<Uuid>,
        stock_location_id: Option<Uuid>,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match (warehouse_id, stock_location_id) {
            (Some(wh), Some(loc)) => {
                self.lot_repo
                    .find_available_for_fefo(executor, product_unit_id, wh, loc)
                    .await
            }
            (Some(wh), None) => {
                self.lot_repo
                    .find_available_by_warehouse(executor, product_unit_id, wh)
                    .await
            }
            (None, Some(loc)) => {
                self.lot_repo
                    .find_available_by_location(executor, product_unit_id, loc)
                    .await
            }
            (None, None) => {
                self.lot_repo
                    .find_available_by_product(executor, product_unit_id)
                    .await
            }
        }
    }

    /// Lotes ativos com validade dentro de `days` dias (os já vencidos saem
    /// da lista — aparecem na consulta de vencidos).
    pub async fn lots_near_expiry(&self, days: i64) -> Result<Vec<StockLot>, AppError> {
        let today = Utc::now().date_naive();
        let threshold = today + chrono::Duration::days(days);
        let mut lots = self.lot_repo.find_near_expiry(threshold).await?;
        lots.retain(|lot| lot.is_near_expiry(today, days));
        Ok(lots)
    }

    pub async fn expired_lots(&self) -> Result<Vec<StockLot>, AppError> {
        self.lot_repo.find_expired(Utc::now().date_naive()).await
    }

    /// Varredura de validade: marca como EXPIRED todo lote ativo com a data
    /// vencida. Devolve os lotes marcados.
    pub async fn mark_expired<'e, E>(&self, executor: E) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let today = Utc::now().date_naive();
        let mut lots = self
            .lot_repo
            .find_expired_for_update(&mut *tx, today)
            .await?;

        for lot in &mut lots {
            if lot.is_expired(today) {
                lot.status = LotStatus::Expired;
                lot.updated_at = Some(Utc::now());
                self.lot_repo.save(&mut *tx, lot).await?;
            }
        }
        tx.commit().await?;

        if !lots.is_empty() {
            tracing::info!("{} lote(s) marcados como vencidos", lots.len());
        }
        Ok(lots)
    }

    pub async fn reserved_lots(
        &self,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError> {
        self.lot_repo
            .find_reserved(product_unit_id, warehouse_id, stock_location_id)
            .await
    }

    pub async fn statistics(&self) -> Result<LotStatistics, AppError> {
        let counts = self.lot_repo.count_by_status().await?;
        let mut stats = LotStatistics {
            total_lots: 0,
            active_lots: 0,
            expired_lots: 0,
            depleted_lots: 0,
            cancelled_lots: 0,
        };
        for (status, count) in counts {
            stats.total_lots += count;
            match status {
                LotStatus::Active => stats.active_lots = count,
                LotStatus::Expired => stats.expired_lots = count,
                LotStatus::Depleted => stats.depleted_lots = count,
                LotStatus::Cancelled => stats.cancelled_lots = count,
            }
        }
        Ok(stats)
    }

    // ---
    // Manutenção
    // ---

    /// Atualiza apenas os campos descritivos do lote.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
        expiry_date: Option<NaiveDate>,
        manufacturing_date: Option<NaiveDate>,
        supplier_name: Option<String>,
        supplier_batch_number: Option<String>,
        note: Option<String>,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut lot = self
            .lot_repo
            .find_by_id_for_update(&mut *tx, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))?;

        lot.expiry_date = expiry_date;
        lot.manufacturing_date = manufacturing_date;
        lot.supplier_name = supplier_name;
        lot.supplier_batch_number = supplier_batch_number;
        lot.note = note;
        lot.updated_at = Some(Utc::now());

        self.lot_repo.save(&mut *tx, &lot).await?;
        tx.commit().await?;
        Ok(lot)
    }

    /// Mudança manual de status (ex.: marcar EXPIRED após varredura).
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
        new_status: LotStatus,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut lot = self
            .lot_repo
            .find_by_id_for_update(&mut *tx, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))?;

        lot.status = new_status;
        lot.updated_at = Some(Utc::now());

        self.lot_repo.save(&mut *tx, &lot).await?;
        tx.commit().await?;

        tracing::info!("Lote '{}' agora está {:?}", lot.lot_number, new_status);
        Ok(lot)
    }

    /// Aposentadoria suave: só cancela lote sem quantidade física restante.
    pub async fn delete<'e, E>(&self, executor: E, lot_id: Uuid) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut lot = self
            .lot_repo
            .find_by_id_for_update(&mut *tx, lot_id)
            .await?
            .ok_or(AppError::LotNotFound(lot_id))?;

        if lot.current_quantity > 0 {
            return Err(AppError::InvalidState(format!(
                "o lote '{}' ainda tem {} unidades físicas e não pode ser cancelado",
                lot.lot_number, lot.current_quantity
            )));
        }

        lot.status = LotStatus::Cancelled;
        lot.updated_at = Some(Utc::now());
        self.lot_repo.save(&mut *tx, &lot).await?;
        tx.commit().await?;
        Ok(lot)
    }
}
