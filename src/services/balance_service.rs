// src/services/balance_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BalanceRepository,
    models::stock::{StockBalance, StockTransaction, TransactionType},
};

// O saldo é uma projeção materializada da soma dos lotes. Toda operação que
// muda quantidade em lote tem a operação espelhada aqui, dentro da MESMA
// transação do chamador — por isso os métodos mutantes recebem o executor.
#[derive(Clone)]
pub struct BalanceService {
    balance_repo: BalanceRepository,
}

impl BalanceService {
    pub fn new(balance_repo: BalanceRepository) -> Self {
        Self { balance_repo }
    }

    /// Aplica o efeito de uma transação de estoque sobre o saldo do contexto.
    /// IMPORT cria a linha preguiçosamente; EXPORT exige que ela exista;
    /// ADJUST é valor absoluto (correção de contagem, não delta).
    pub async fn apply_transaction<'e, E>(
        &self,
        executor: E,
        transaction: &StockTransaction,
    ) -> Result<StockBalance, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut balance = match transaction.transaction_type {
            TransactionType::Import | TransactionType::Adjust | TransactionType::Transfer => {
                self.balance_repo
                    .create_if_absent(
                        &mut *tx,
                        transaction.product_unit_id,
                        transaction.warehouse_id,
                        transaction.stock_location_id,
                    )
                    .await?;
                self.find_for_update(&mut *tx, transaction).await?
            }
            TransactionType::Export => self.find_for_update(&mut *tx, transaction).await?,
        };

        match transaction.transaction_type {
            TransactionType::Import => balance.apply_import(transaction.quantity)?,
            TransactionType::Export => balance.apply_export(transaction.quantity)?,
            TransactionType::Adjust => balance.apply_adjust(transaction.quantity)?,
            // Transferências viram um par EXPORT/IMPORT; uma transação
            // registrada como TRANSFER não mexe no saldo por si só.
            TransactionType::Transfer => {}
        }

        self.balance_repo.save(&mut *tx, &balance).await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Desfaz o efeito de uma transação apagada aplicando o delta INVERSO —
    /// nunca recalculando a partir dos lotes, para preservar a trilha de
    /// auditoria independente do estado dos lotes.
    pub async fn reverse_transaction<'e, E>(
        &self,
        executor: E,
        transaction: &StockTransaction,
    ) -> Result<StockBalance, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut balance = self.find_for_update(&mut *tx, transaction).await?;

        match transaction.transaction_type {
            // O inverso de uma importação é uma baixa física (e vice-versa);
            // os guardas dos helpers valem igual aqui.
            TransactionType::Import => balance.apply_export(transaction.quantity)?,
            TransactionType::Export => balance.apply_import(transaction.quantity)?,
            TransactionType::Adjust => {
                return Err(AppError::InvalidState(
                    "transações de ajuste não têm delta e não podem ser revertidas".to_string(),
                ));
            }
            TransactionType::Transfer => {}
        }

        self.balance_repo.save(&mut *tx, &balance).await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Correção manual do saldo (valor absoluto contado).
    pub async fn adjust<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        new_quantity: i32,
    ) -> Result<StockBalance, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.balance_repo
            .create_if_absent(&mut *tx, product_unit_id, warehouse_id, stock_location_id)
            .await?;
        let mut balance = self
            .balance_repo
            .find_by_triple_for_update(&mut *tx, product_unit_id, warehouse_id, stock_location_id)
            .await?
            .ok_or(AppError::StockBalanceNotFound {
                product_unit_id,
                warehouse_id,
                stock_location_id,
            })?;

        balance.apply_adjust(new_quantity)?;
        self.balance_repo.save(&mut *tx, &balance).await?;
        tx.commit().await?;

        tracing::info!(
            "Saldo ajustado para {} (produto {}, armazém {}, posição {})",
            new_quantity,
            product_unit_id,
            warehouse_id,
            stock_location_id
        );
        Ok(balance)
    }

    // ---
    // Consultas
    // ---

    pub async fn get_by_triple<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Option<StockBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.balance_repo
            .find_by_triple(executor, product_unit_id, warehouse_id, stock_location_id)
            .await
    }

    /// Quantidade física atual do contexto (0 se o saldo ainda não existe).
    pub async fn current_quantity<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = self
            .balance_repo
            .find_by_triple(executor, product_unit_id, warehouse_id, stock_location_id)
            .await?;
        Ok(balance.map(|b| b.quantity).unwrap_or(0))
    }

    /// Listagem com filtros opcionais, na ordem de prioridade do chamador.
    pub async fn list(
        &self,
        product_unit_id: Option<Uuid>,
        warehouse_id: Option<Uuid>,
        stock_location_id: Option<Uuid>,
    ) -> Result<Vec<StockBalance>, AppError> {
        if let Some(product) = product_unit_id {
            self.balance_repo.list_by_product(product).await
        } else if let Some(warehouse) = warehouse_id {
            self.balance_repo.list_by_warehouse(warehouse).await
        } else if let Some(location) = stock_location_id {
            self.balance_repo.list_by_location(location).await
        } else {
            self.balance_repo.list_all().await
        }
    }

    pub async fn total_quantity_by_product(
        &self,
        product_unit_id: Uuid,
    ) -> Result<i32, AppError> {
        self.balance_repo
            .total_quantity_by_product(product_unit_id)
            .await
    }

    pub async fn total_available_by_product(
        &self,
        product_unit_id: Uuid,
    ) -> Result<i32, AppError> {
        self.balance_repo
            .total_available_by_product(product_unit_id)
            .await
    }

    async fn find_for_update(
        &self,
        conn: &mut sqlx::PgConnection,
        transaction: &StockTransaction,
    ) -> Result<StockBalance, AppError> {
        self.balance_repo
            .find_by_triple_for_update(
                &mut *conn,
                transaction.product_unit_id,
                transaction.warehouse_id,
                transaction.stock_location_id,
            )
            .await?
            .ok_or(AppError::StockBalanceNotFound {
                product_unit_id: transaction.product_unit_id,
                warehouse_id: transaction.warehouse_id,
                stock_location_id: transaction.stock_location_id,
            })
    }
}
