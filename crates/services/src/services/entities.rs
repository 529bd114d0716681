//! Per-entity configuration for the seven resource screens.

use chrono::NaiveDate;
use db::{
    gateway::{Join, OrderBy, SelectQuery},
    models::{
        record::{EntityRecord, FieldValue, Fields, RecordId},
        table::Table,
    },
};

use super::validator::{EntitySchema, FieldSpec};

pub const ESPECIES: &[&str] = &["Cachorro", "Gato", "Pássaro", "Coelho", "Outro"];
pub const CARGOS: &[&str] = &["Veterinário", "Tosador(a)", "Atendente", "Gerente", "Auxiliar"];
pub const CATEGORIAS_PRODUTO: &[&str] = &[
    "Alimentação",
    "Higiene",
    "Brinquedos",
    "Acessórios",
    "Medicamentos",
    "Outros",
];
pub const SERVICOS: &[&str] = &["consulta", "banho", "vacina", "cirurgia", "exame"];
pub const STATUS_AGENDAMENTO: &[&str] = &["confirmado", "pendente", "cancelado"];
pub const STATUS_VENDA: &[&str] = &["concluída", "pendente", "cancelada"];
pub const TIPOS_TRANSACAO: &[&str] = &["receita", "despesa"];
pub const FORMAS_PAGAMENTO: &[&str] = &[
    "Dinheiro",
    "Cartão de Crédito",
    "Cartão de Débito",
    "Transferência",
    "PIX",
];

/// Toast titles and prompts shown for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMessages {
    pub created: &'static str,
    pub updated: &'static str,
    pub deleted: &'static str,
    pub delete_prompt: &'static str,
}

/// Everything the generic controllers need to serve one entity type
#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub table: Table,
    pub label: &'static str,
    pub schema: EntitySchema,
    pub order_by: OrderBy,
    pub joins: Vec<Join>,
    /// Fields matched by free-text search
    pub search_fields: &'static [&'static str],
    /// Field used to name a record in notifications
    pub title_field: &'static str,
    pub messages: EntityMessages,
    seed: fn() -> Vec<EntityRecord>,
}

impl EntityConfig {
    pub fn for_table(table: Table) -> Self {
        match table {
            Table::Clients => clients(),
            Table::Animals => animals(),
            Table::Employees => employees(),
            Table::Products => products(),
            Table::Appointments => appointments(),
            Table::Sales => sales(),
            Table::Transactions => transactions(),
        }
    }

    pub fn select_query(&self) -> SelectQuery {
        self.joins
            .iter()
            .cloned()
            .fold(SelectQuery::new().order_by(self.order_by.clone()), |q, j| {
                q.join(j)
            })
    }

    /// Records a static-seed screen starts with
    pub fn seed_records(&self) -> Vec<EntityRecord> {
        (self.seed)()
    }

    /// Human name of a record for notifications, e.g. "Maria Silva"
    pub fn title_of(&self, record: &EntityRecord) -> Option<String> {
        record
            .get(self.title_field)
            .filter(|v| !v.is_null())
            .map(FieldValue::to_form_string)
    }

    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.schema = schema;
        self
    }
}

fn date(raw: &str) -> FieldValue {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(FieldValue::Date)
        .unwrap_or_else(|_| FieldValue::text(raw))
}

fn record(id: i64, pairs: Vec<(&str, FieldValue)>) -> EntityRecord {
    let fields: Fields = pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    EntityRecord::new(RecordId(id), fields)
}

fn joined(mut record: EntityRecord, alias: &str, target: Option<&EntityRecord>) -> EntityRecord {
    record
        .joined
        .insert(alias.to_string(), target.map(EntityRecord::as_joined));
    record
}

fn person_fields(schema: EntitySchema) -> EntitySchema {
    schema
        .field(FieldSpec::text("nome").min_len(2, "Informe o nome"))
        .field(
            FieldSpec::text("cpf")
                .min_len(11, "CPF inválido")
                .max_len(14, "CPF inválido"),
        )
        .field(FieldSpec::text("email").email("E-mail inválido"))
        .field(FieldSpec::text("telefone").min_len(8, "Telefone inválido"))
        .field(FieldSpec::text("endereco").min_len(3, "Endereço inválido"))
}

pub fn clients() -> EntityConfig {
    EntityConfig {
        table: Table::Clients,
        label: "Cliente",
        schema: person_fields(EntitySchema::new(Table::Clients)),
        order_by: OrderBy::newest_first(),
        joins: Vec::new(),
        search_fields: &["nome", "email", "telefone"],
        title_field: "nome",
        messages: EntityMessages {
            created: "Cliente cadastrado",
            updated: "Cliente atualizado",
            deleted: "Cliente excluído",
            delete_prompt: "Tem certeza que deseja excluir este cliente?",
        },
        seed: seed_clients,
    }
}

fn seed_clients() -> Vec<EntityRecord> {
    vec![
        record(
            1,
            vec![
                ("nome", FieldValue::text("Maria Silva")),
                ("email", FieldValue::text("maria.silva@email.com")),
                ("telefone", FieldValue::text("(11) 99999-9999")),
                ("endereco", FieldValue::text("Rua das Flores, 123")),
                ("ultima_visita", date("2024-01-15")),
            ],
        ),
        record(
            2,
            vec![
                ("nome", FieldValue::text("João Santos")),
                ("email", FieldValue::text("joao.santos@email.com")),
                ("telefone", FieldValue::text("(11) 88888-8888")),
                ("endereco", FieldValue::text("Av. Principal, 456")),
                ("ultima_visita", date("2024-01-10")),
            ],
        ),
    ]
}

pub fn animals() -> EntityConfig {
    EntityConfig {
        table: Table::Animals,
        label: "Animal",
        schema: EntitySchema::new(Table::Animals)
            .field(FieldSpec::text("nome").min_len(2, "Informe o nome do animal"))
            .field(FieldSpec::text("especie").one_of(ESPECIES, "Selecione a espécie"))
            .field(FieldSpec::text("raca").min_len(2, "Informe a raça"))
            .field(FieldSpec::text("idade").min_len(1, "Informe a idade"))
            .field(FieldSpec::text("peso").min_len(1, "Informe o peso"))
            .field(
                FieldSpec::reference("cliente_id", Table::Clients).required("Selecione o cliente"),
            ),
        order_by: OrderBy::newest_first(),
        joins: vec![Join::new("cliente_id", Table::Clients, "cliente")],
        search_fields: &["nome", "especie", "raca"],
        title_field: "nome",
        messages: EntityMessages {
            created: "Animal cadastrado",
            updated: "Animal atualizado",
            deleted: "Animal excluído",
            delete_prompt: "Tem certeza que deseja excluir este animal?",
        },
        seed: seed_animals,
    }
}

fn seed_animals() -> Vec<EntityRecord> {
    let owners = seed_clients();
    vec![
        joined(
            record(
                1,
                vec![
                    ("nome", FieldValue::text("Rex")),
                    ("especie", FieldValue::text("Cachorro")),
                    ("raca", FieldValue::text("Golden Retriever")),
                    ("idade", FieldValue::text("3 anos")),
                    ("peso", FieldValue::text("25 kg")),
                    ("cliente_id", RecordId(1).into()),
                    ("ultima_consulta", date("2024-01-15")),
                ],
            ),
            "cliente",
            owners.first(),
        ),
        joined(
            record(
                2,
                vec![
                    ("nome", FieldValue::text("Mimi")),
                    ("especie", FieldValue::text("Gato")),
                    ("raca", FieldValue::text("Siamês")),
                    ("idade", FieldValue::text("2 anos")),
                    ("peso", FieldValue::text("4 kg")),
                    ("cliente_id", RecordId(2).into()),
                ],
            ),
            "cliente",
            owners.get(1),
        ),
    ]
}

pub fn employees() -> EntityConfig {
    EntityConfig {
        table: Table::Employees,
        label: "Funcionário",
        schema: person_fields(EntitySchema::new(Table::Employees))
            .field(FieldSpec::text("cargo").one_of(CARGOS, "Selecione o cargo"))
            .field(FieldSpec::number("salario").non_negative("Informe o salário"))
            .field(FieldSpec::text("especialidade").optional()),
        order_by: OrderBy::newest_first(),
        joins: Vec::new(),
        search_fields: &["nome", "cargo"],
        title_field: "nome",
        messages: EntityMessages {
            created: "Funcionário cadastrado",
            updated: "Funcionário atualizado",
            deleted: "Funcionário excluído",
            delete_prompt: "Tem certeza que deseja excluir este funcionário?",
        },
        seed: seed_employees,
    }
}

fn seed_employees() -> Vec<EntityRecord> {
    vec![
        record(
            1,
            vec![
                ("nome", FieldValue::text("Dr. Carlos Veterinário")),
                ("email", FieldValue::text("carlos@petshop.com")),
                ("telefone", FieldValue::text("(11) 99999-8888")),
                ("endereco", FieldValue::text("Rua das Clínicas, 456")),
                ("cargo", FieldValue::text("Veterinário")),
                ("salario", FieldValue::Number(8500.0)),
                ("data_admissao", date("2023-01-15")),
                ("status", FieldValue::text("Ativo")),
                ("especialidade", FieldValue::text("Clínica Geral")),
            ],
        ),
        record(
            2,
            vec![
                ("nome", FieldValue::text("Ana Tosadora")),
                ("email", FieldValue::text("ana@petshop.com")),
                ("telefone", FieldValue::text("(11) 88888-7777")),
                ("endereco", FieldValue::text("Av. Pet Care, 789")),
                ("cargo", FieldValue::text("Tosador(a)")),
                ("salario", FieldValue::Number(3200.0)),
                ("data_admissao", date("2023-03-20")),
                ("status", FieldValue::text("Ativo")),
                ("especialidade", FieldValue::text("Estética Canina")),
            ],
        ),
    ]
}

pub fn products() -> EntityConfig {
    EntityConfig {
        table: Table::Products,
        label: "Produto",
        schema: EntitySchema::new(Table::Products)
            .field(FieldSpec::text("nome").min_len(2, "Informe o nome do produto"))
            .field(
                FieldSpec::text("codigo").min_len(3, "Código deve ter pelo menos 3 caracteres"),
            )
            .field(
                FieldSpec::text("categoria").one_of(CATEGORIAS_PRODUTO, "Selecione uma categoria"),
            )
            .field(FieldSpec::number("preco").positive("Informe o preço"))
            .field(FieldSpec::integer("estoque").non_negative("Informe a quantidade em estoque"))
            .field(FieldSpec::integer("estoque_minimo").non_negative("Informe o estoque mínimo"))
            .field(FieldSpec::text("descricao").optional()),
        order_by: OrderBy::newest_first(),
        joins: Vec::new(),
        search_fields: &["nome", "codigo", "categoria"],
        title_field: "nome",
        messages: EntityMessages {
            created: "Produto cadastrado",
            updated: "Produto atualizado",
            deleted: "Produto excluído",
            delete_prompt: "Tem certeza que deseja excluir este produto?",
        },
        seed: seed_products,
    }
}

fn seed_products() -> Vec<EntityRecord> {
    vec![
        record(
            1,
            vec![
                ("nome", FieldValue::text("Ração Premium Dog")),
                ("codigo", FieldValue::text("RAC001")),
                ("categoria", FieldValue::text("Alimentação")),
                ("preco", FieldValue::Number(89.9)),
                ("estoque", FieldValue::Number(25.0)),
                ("estoque_minimo", FieldValue::Number(5.0)),
                ("descricao", FieldValue::Null),
            ],
        ),
        record(
            2,
            vec![
                ("nome", FieldValue::text("Shampoo Antipulgas")),
                ("codigo", FieldValue::text("HIG001")),
                ("categoria", FieldValue::text("Higiene")),
                ("preco", FieldValue::Number(24.5)),
                ("estoque", FieldValue::Number(12.0)),
                ("estoque_minimo", FieldValue::Number(10.0)),
                ("descricao", FieldValue::Null),
            ],
        ),
    ]
}

pub fn appointments() -> EntityConfig {
    EntityConfig {
        table: Table::Appointments,
        label: "Agendamento",
        schema: EntitySchema::new(Table::Appointments)
            .field(
                FieldSpec::reference("cliente_id", Table::Clients).required("Selecione o cliente"),
            )
            .field(FieldSpec::reference("animal_id", Table::Animals).required("Selecione o animal"))
            .field(FieldSpec::text("servico").one_of(SERVICOS, "Selecione o serviço"))
            .field(FieldSpec::date("data").required("Informe a data"))
            .field(FieldSpec::time("horario").required("Informe o horário"))
            .field(
                FieldSpec::text("status")
                    .one_of(STATUS_AGENDAMENTO, "Selecione o status")
                    .default_value("pendente"),
            ),
        order_by: OrderBy::newest_first(),
        joins: vec![
            Join::new("cliente_id", Table::Clients, "cliente"),
            Join::new("animal_id", Table::Animals, "animal"),
        ],
        search_fields: &["servico", "status"],
        title_field: "servico",
        messages: EntityMessages {
            created: "Agendamento criado",
            updated: "Agendamento atualizado",
            deleted: "Agendamento excluído",
            delete_prompt: "Tem certeza que deseja excluir este agendamento?",
        },
        seed: seed_appointments,
    }
}

fn seed_appointments() -> Vec<EntityRecord> {
    let owners = seed_clients();
    let pets = seed_animals();
    let appointment = |id: i64, owner: usize, servico: &str, horario: &str, status: &str| {
        let base = record(
            id,
            vec![
                ("cliente_id", owners[owner].id.into()),
                ("animal_id", pets[owner].id.into()),
                ("servico", FieldValue::text(servico)),
                ("data", date("2024-01-15")),
                ("horario", FieldValue::text(horario)),
                ("status", FieldValue::text(status)),
            ],
        );
        let base = joined(base, "cliente", owners.get(owner));
        joined(base, "animal", pets.get(owner))
    };
    vec![
        appointment(1, 0, "consulta", "09:00", "confirmado"),
        appointment(2, 1, "banho", "14:30", "pendente"),
    ]
}

pub fn sales() -> EntityConfig {
    EntityConfig {
        table: Table::Sales,
        label: "Venda",
        schema: EntitySchema::new(Table::Sales)
            .field(
                FieldSpec::reference("cliente_id", Table::Clients).required("Selecione o cliente"),
            )
            .field(FieldSpec::text("produtos").required("Informe os produtos"))
            .field(FieldSpec::number("total").positive("Informe o total da venda"))
            .field(
                FieldSpec::number("desconto")
                    .non_negative("Desconto inválido")
                    .default_value("0"),
            )
            .field(
                FieldSpec::text("status")
                    .one_of(STATUS_VENDA, "Selecione o status")
                    .default_value("pendente"),
            )
            .field(FieldSpec::text("observacoes").optional())
            .field(FieldSpec::date("data").required("Informe a data").default_today()),
        order_by: OrderBy::newest_first(),
        joins: vec![Join::new("cliente_id", Table::Clients, "cliente")],
        search_fields: &["produtos", "status"],
        title_field: "produtos",
        messages: EntityMessages {
            created: "Venda criada com sucesso!",
            updated: "Venda atualizada",
            deleted: "Venda excluída",
            delete_prompt: "Tem certeza que deseja excluir esta venda?",
        },
        seed: seed_sales,
    }
}

fn seed_sales() -> Vec<EntityRecord> {
    let owners = seed_clients();
    let sale = |id: i64, owner: usize, produtos: &str, total: f64, dia: &str, status: &str| {
        let base = record(
            id,
            vec![
                ("cliente_id", owners[owner].id.into()),
                ("produtos", FieldValue::text(produtos)),
                ("total", FieldValue::Number(total)),
                ("desconto", FieldValue::Number(0.0)),
                ("status", FieldValue::text(status)),
                ("observacoes", FieldValue::Null),
                ("data", date(dia)),
            ],
        );
        joined(base, "cliente", owners.get(owner))
    };
    vec![
        sale(1, 0, "Ração Premium, Brinquedo", 89.9, "2024-01-15", "concluída"),
        sale(2, 1, "Consulta Veterinária, Medicamento", 150.0, "2024-01-15", "pendente"),
        sale(3, 0, "Banho e Tosa", 45.0, "2024-01-14", "concluída"),
    ]
}

pub fn transactions() -> EntityConfig {
    EntityConfig {
        table: Table::Transactions,
        label: "Transação",
        schema: EntitySchema::new(Table::Transactions)
            .field(FieldSpec::text("tipo").one_of(TIPOS_TRANSACAO, "Tipo é obrigatório"))
            .field(FieldSpec::text("descricao").min_len(1, "Descrição é obrigatória"))
            .field(FieldSpec::number("valor").positive("Valor deve ser maior que zero"))
            .field(FieldSpec::text("categoria").min_len(1, "Categoria é obrigatória"))
            .field(
                FieldSpec::text("forma_pagamento")
                    .one_of(FORMAS_PAGAMENTO, "Forma de pagamento é obrigatória"),
            )
            .field(FieldSpec::date("data").required("Informe a data").default_today()),
        order_by: OrderBy::newest_first(),
        joins: Vec::new(),
        search_fields: &["descricao", "categoria"],
        title_field: "descricao",
        messages: EntityMessages {
            created: "Transação adicionada",
            updated: "Transação atualizada",
            deleted: "Transação excluída",
            delete_prompt: "Tem certeza que deseja excluir esta transação?",
        },
        seed: seed_transactions,
    }
}

fn seed_transactions() -> Vec<EntityRecord> {
    // (tipo, descricao, valor, data, categoria, forma_pagamento)
    let rows = [
        ("receita", "Venda de produtos", 450.0, "2024-01-15", "Vendas", "Cartão de Crédito"),
        ("despesa", "Compra de ração", 230.0, "2024-01-15", "Estoque", "Transferência"),
        ("receita", "Consulta veterinária", 150.0, "2024-01-14", "Serviços", "Dinheiro"),
        ("despesa", "Aluguel", 1200.0, "2024-01-01", "Infraestrutura", "Transferência"),
    ];
    rows.into_iter()
        .zip(1..)
        .map(|((tipo, descricao, valor, dia, categoria, forma), id)| {
            record(
                id,
                vec![
                    ("tipo", FieldValue::text(tipo)),
                    ("descricao", FieldValue::text(descricao)),
                    ("valor", FieldValue::Number(valor)),
                    ("data", date(dia)),
                    ("categoria", FieldValue::text(categoria)),
                    ("forma_pagamento", FieldValue::text(forma)),
                ],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_every_table_has_a_config() {
        for table in Table::iter() {
            let config = EntityConfig::for_table(table);
            assert_eq!(config.table, table);
            assert_eq!(config.schema.table(), table);
            assert!(config.schema.spec(config.title_field).is_some(), "{table}");
        }
    }

    #[test]
    fn test_seed_ids_are_unique() {
        for table in Table::iter() {
            let seed = EntityConfig::for_table(table).seed_records();
            let ids: HashSet<_> = seed.iter().map(|r| r.id).collect();
            assert_eq!(ids.len(), seed.len(), "{table}");
            assert!(!seed.is_empty());
        }
    }

    #[test]
    fn test_seed_records_pass_their_own_schema_where_complete() {
        for config in [products(), transactions(), sales(), appointments()] {
            for record in config.seed_records() {
                let form = config.schema.seed_from(&record);
                assert!(config.schema.validate(&form).is_ok(), "{} {}", config.table, record.id);
            }
        }
    }

    #[test]
    fn test_select_query_carries_order_and_joins() {
        let query = appointments().select_query();
        assert_eq!(query.order_by, Some(OrderBy::newest_first()));
        let aliases: Vec<_> = query.joins.iter().map(|j| j.alias.as_str()).collect();
        assert_eq!(aliases, vec!["cliente", "animal"]);
    }

    #[test]
    fn test_seed_joins_resolve_owner() {
        let rex = &animals().seed_records()[0];
        let owner = rex.joined("cliente").unwrap();
        assert_eq!(owner.get("nome"), Some(&FieldValue::text("Maria Silva")));
    }
}
