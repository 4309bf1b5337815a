use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use hekma_invoice::catalog::{self, load_csv_file, Catalog, SEARCH_LIMIT};
use hekma_invoice::config::{config_dir, load_config, resolve_output_dir, CONFIG_TEMPLATE};
use hekma_invoice::draft::{coerce_quantity, FileStore, InvoiceEditor, Subtype, MAX_ITEMS};
use hekma_invoice::error::{InvoiceError, Result};
use hekma_invoice::render::{self, money, Assets, DocumentJob, RenderPath, ShipmentReport};
use hekma_invoice::snapshot::InvoiceSnapshot;

#[derive(Parser)]
#[command(name = "hekma-invoice")]
#[command(version, about = "Bilingual proforma and commercial invoicing", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Browse and maintain the product catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Edit the working draft of an invoice type
    #[command(subcommand)]
    Draft(DraftCommand),

    /// Render the current draft to a PDF
    Generate {
        /// Invoice type: proforma or commercial
        #[arg(short = 't', long = "type", default_value = "proforma")]
        subtype: Subtype,

        /// Capture the invoice as an image and paginate it instead of drawing vectors
        #[arg(long)]
        raster: bool,

        /// Directory for the PDF (default: [pdf].output_dir from config.toml)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Render a waste shipment tracking report
    ShipmentReport {
        #[command(flatten)]
        source: ShipmentSource,

        /// Directory for the PDF (default: [pdf].output_dir from config.toml)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ShipmentSource {
    /// Shipment record in TOML
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Use the built-in sample shipment
    #[arg(long)]
    sample: bool,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// List products, optionally filtered by name or code
    List {
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long, default_value_t = SEARCH_LIMIT)]
        limit: usize,
    },

    /// Load products from a `Name,Code,Price` CSV file
    Import {
        file: PathBuf,

        /// Add to the current catalog instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Restore the built-in product set
    Reset,
}

#[derive(Args)]
struct DraftType {
    /// Invoice type: proforma or commercial
    #[arg(short = 't', long = "type", default_value = "proforma")]
    subtype: Subtype,
}

#[derive(Subcommand)]
enum DraftCommand {
    /// Print the draft with its totals
    Show {
        #[command(flatten)]
        draft: DraftType,
    },

    /// Set client details
    Client {
        #[command(flatten)]
        draft: DraftType,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        tel: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        country: Option<String>,
        /// Invoice date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Document number (PI No.)
        #[arg(long)]
        number: Option<String>,
        /// Tax percentage
        #[arg(long)]
        tax: Option<f64>,
        /// Discount percentage
        #[arg(long)]
        discount: Option<f64>,
    },

    /// Switch the invoice currency (USD or EGP)
    Currency {
        #[command(flatten)]
        draft: DraftType,
        code: String,
    },

    /// Append a blank line item
    AddItem {
        #[command(flatten)]
        draft: DraftType,
    },

    /// Remove a line item by id
    RemoveItem {
        #[command(flatten)]
        draft: DraftType,
        id: String,
    },

    /// Edit a line item
    Item {
        #[command(flatten)]
        draft: DraftType,
        id: String,
        /// Fill the row from the catalog product with this code
        #[arg(long, conflicts_with = "product")]
        code: Option<String>,
        /// Fill the row from the catalog product with this exact name
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        item_code: Option<String>,
        /// Quantity; anything below 1 or non-numeric becomes 1
        #[arg(long, allow_hyphen_values = true)]
        qty: Option<String>,
        /// Unit price in the invoice currency; negatives become 0
        #[arg(long, allow_hyphen_values = true)]
        price: Option<f64>,
    },

    /// Set shipping and payment terms (printed on proforma invoices)
    Terms {
        #[command(flatten)]
        draft: DraftType,
        #[arg(long)]
        payment_terms: Option<String>,
        #[arg(long)]
        price_validity: Option<String>,
        #[arg(long)]
        port_of_loading: Option<String>,
        #[arg(long)]
        port_of_destination: Option<String>,
        #[arg(long)]
        time_of_shipment: Option<String>,
        #[arg(long)]
        bank_name: Option<String>,
        #[arg(long)]
        account_no: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },

    /// Discard the stored draft and start over
    Clear {
        #[command(flatten)]
        draft: DraftType,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Catalog(command) => {
            require_initialized(&cfg_dir)?;
            match command {
                CatalogCommand::List { query, limit } => cmd_catalog_list(&cfg_dir, query, limit),
                CatalogCommand::Import { file, append } => {
                    cmd_catalog_import(&cfg_dir, &file, append)
                }
                CatalogCommand::Reset => cmd_catalog_reset(&cfg_dir),
            }
        }
        Commands::Draft(command) => {
            require_initialized(&cfg_dir)?;
            cmd_draft(&cfg_dir, command)
        }
        Commands::Generate {
            subtype,
            raster,
            output_dir,
        } => cmd_generate(&cfg_dir, subtype, raster, output_dir),
        Commands::ShipmentReport { source, output_dir } => {
            cmd_shipment_report(&cfg_dir, source, output_dir)
        }
    }
}

fn require_initialized(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(InvoiceError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    Ok(())
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(InvoiceError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::create_dir_all(cfg_dir.join("drafts"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized invoice config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Import your products:       hekma-invoice catalog import products.csv");
    println!();
    println!("Then fill in a draft and generate it:");
    println!("  hekma-invoice draft item --type proforma 1 --code HF32 --qty 10");
    println!("  hekma-invoice generate --type proforma");

    Ok(())
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PRICE (USD)")]
    price: String,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "QTY")]
    quantity: u32,
    #[tabled(rename = "UNIT PRICE")]
    unit_price: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

/// List catalog products
fn cmd_catalog_list(cfg_dir: &Path, query: Option<String>, limit: usize) -> Result<()> {
    let catalog = catalog::load_catalog(cfg_dir)?;
    let products = match query.as_deref() {
        Some(q) => catalog.search(q, limit),
        None => catalog.products().iter().take(limit).collect(),
    };

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    let rows: Vec<ProductRow> = products
        .iter()
        .map(|p| ProductRow {
            code: p.code.clone(),
            name: p.name.clone(),
            price: if p.requires_manual_entry() {
                "Manual entry required".to_string()
            } else {
                format!("{:.2}", p.unit_price_usd)
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("Showing {} of {} products", products.len(), catalog.len());

    Ok(())
}

/// Import products from CSV, replacing or extending the catalog
fn cmd_catalog_import(cfg_dir: &Path, file: &Path, append: bool) -> Result<()> {
    let records = load_csv_file(file)?;
    if records.is_empty() {
        return Err(InvoiceError::EmptyImport);
    }
    let count = records.len();

    let mut catalog = catalog::load_catalog(cfg_dir)?;
    if append {
        catalog.append_all(records);
    } else {
        catalog.replace_all(records);
    }
    catalog::save_catalog(cfg_dir, &catalog)?;

    println!("Successfully imported {count} products from CSV file");
    println!("Catalog now holds {} products", catalog.len());
    Ok(())
}

/// Restore the built-in product set
fn cmd_catalog_reset(cfg_dir: &Path) -> Result<()> {
    let catalog = catalog::reset_catalog(cfg_dir)?;
    println!(
        "Catalog reset to the default set of {} products",
        catalog.len()
    );
    Ok(())
}

fn open_editor(cfg_dir: &Path, subtype: Subtype) -> InvoiceEditor<FileStore> {
    InvoiceEditor::open(FileStore::new(cfg_dir.join("drafts")), subtype)
}

fn cmd_draft(cfg_dir: &Path, command: DraftCommand) -> Result<()> {
    match command {
        DraftCommand::Show { draft } => {
            let editor = open_editor(cfg_dir, draft.subtype);
            print_draft(&InvoiceSnapshot::from_draft(editor.draft()), editor.draft());
        }
        DraftCommand::Client {
            draft,
            name,
            tel,
            address,
            country,
            date,
            number,
            tax,
            discount,
        } => {
            let mut editor = open_editor(cfg_dir, draft.subtype);
            editor.update_client(|client| {
                let fields = [
                    (&mut client.name, name),
                    (&mut client.tel, tel),
                    (&mut client.address, address),
                    (&mut client.country, country),
                    (&mut client.date, date),
                    (&mut client.document_number, number),
                ];
                for (slot, value) in fields {
                    if let Some(value) = value {
                        *slot = value;
                    }
                }
                if let Some(tax) = tax {
                    client.tax_percent = tax;
                }
                if let Some(discount) = discount {
                    client.discount_percent = discount;
                }
            });
            println!("Updated client details for the {} draft", draft.subtype);
        }
        DraftCommand::Currency { draft, code } => {
            let catalog = catalog::load_catalog(cfg_dir)?;
            let mut editor = open_editor(cfg_dir, draft.subtype);
            let switch = editor.set_currency(&code, &catalog)?;
            let currency = editor.currency();
            println!(
                "Currency set to {} ({}); repriced {} item(s)",
                currency.code, currency.symbol, switch.converted
            );
            if !switch.untouched.is_empty() {
                println!(
                    "Kept the typed price for item(s) {} (not in the catalog)",
                    switch.untouched.join(", ")
                );
            }
        }
        DraftCommand::AddItem { draft } => {
            let mut editor = open_editor(cfg_dir, draft.subtype);
            match editor.add_item() {
                Some(id) => println!("Added item {id}"),
                None => println!("The invoice already holds the maximum of {MAX_ITEMS} items"),
            }
        }
        DraftCommand::RemoveItem { draft, id } => {
            let mut editor = open_editor(cfg_dir, draft.subtype);
            if editor.remove_item(&id)? {
                println!("Removed item {id}");
            } else {
                println!("Item {id} is the last item and was kept");
            }
        }
        DraftCommand::Item {
            draft,
            id,
            code,
            product,
            description,
            item_code,
            qty,
            price,
        } => {
            let catalog = catalog::load_catalog(cfg_dir)?;
            let mut editor = open_editor(cfg_dir, draft.subtype);
            cmd_edit_item(
                &mut editor,
                &catalog,
                &id,
                ItemEdit {
                    code,
                    product,
                    description,
                    item_code,
                    qty,
                    price,
                },
            )?;
        }
        DraftCommand::Terms {
            draft,
            payment_terms,
            price_validity,
            port_of_loading,
            port_of_destination,
            time_of_shipment,
            bank_name,
            account_no,
            remarks,
        } => {
            let mut editor = open_editor(cfg_dir, draft.subtype);
            editor.update_payment_terms(|terms| {
                let fields = [
                    (&mut terms.payment_terms, payment_terms),
                    (&mut terms.price_validity, price_validity),
                    (&mut terms.port_of_loading, port_of_loading),
                    (&mut terms.port_of_destination, port_of_destination),
                    (&mut terms.time_of_shipment, time_of_shipment),
                    (&mut terms.bank_name, bank_name),
                    (&mut terms.account_no, account_no),
                    (&mut terms.remarks, remarks),
                ];
                for (slot, value) in fields {
                    if let Some(value) = value {
                        *slot = value;
                    }
                }
            });
            if !draft.subtype.carries_payment_terms() {
                println!("Note: {} invoices do not print payment terms", draft.subtype);
            }
            println!("Updated payment terms for the {} draft", draft.subtype);
        }
        DraftCommand::Clear { draft } => {
            let mut editor = open_editor(cfg_dir, draft.subtype);
            editor.clear()?;
            println!("Cleared the {} draft", draft.subtype);
        }
    }
    Ok(())
}

struct ItemEdit {
    code: Option<String>,
    product: Option<String>,
    description: Option<String>,
    item_code: Option<String>,
    qty: Option<String>,
    price: Option<f64>,
}

fn cmd_edit_item(
    editor: &mut InvoiceEditor<FileStore>,
    catalog: &Catalog,
    id: &str,
    edit: ItemEdit,
) -> Result<()> {
    let selected = match (edit.code, edit.product) {
        (Some(code), _) => Some(editor.select_product_by_code(id, &code, catalog)?),
        (None, Some(name)) => Some(editor.select_product_by_name(id, &name, catalog)?),
        (None, None) => None,
    };
    if let Some(description) = edit.description {
        editor.set_description(id, &description)?;
        if catalog.find_by_name(&description).is_none() {
            let suggestions: Vec<&str> = catalog
                .suggest(&description)
                .into_iter()
                .map(|p| p.name.as_str())
                .collect();
            if !suggestions.is_empty() {
                println!("Catalog products starting with '{description}':");
                for name in suggestions {
                    println!("  {name}");
                }
            }
        }
    }
    if let Some(code) = edit.item_code {
        editor.set_item_code(id, &code)?;
    }
    if let Some(qty) = edit.qty {
        editor.set_quantity(id, coerce_quantity(&qty))?;
    }
    if let Some(price) = edit.price {
        editor.set_unit_price(id, price)?;
    }

    let symbol = editor.currency().symbol;
    let Some(item) = editor.draft().item(id) else {
        return Err(InvoiceError::ItemNotFound(id.to_string()));
    };
    if let Some(product) = selected.filter(|_| edit.price.is_none()) {
        if product.unit_price == 0.0 {
            println!("Price for '{}' must be entered manually (--price)", product.description);
        }
    }
    println!(
        "Item {}: [{}] {} | {} x {} = {}",
        item.id,
        if item.item_code.is_empty() { "-" } else { item.item_code.as_str() },
        item.description,
        item.quantity,
        money(symbol, item.unit_price),
        money(symbol, item.total)
    );
    Ok(())
}

fn print_draft(snapshot: &InvoiceSnapshot, draft: &hekma_invoice::InvoiceDraft) {
    let symbol = snapshot.currency_symbol.as_str();
    let show = |value: &str| {
        if value.trim().is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    println!("{} invoice draft ({})", draft.subtype, snapshot.currency);
    println!();
    println!("Client:    {}", show(&snapshot.client_name));
    println!("Tel:       {}", show(&snapshot.client_tel));
    println!("Address:   {}", show(&snapshot.client_address));
    println!("Country:   {}", show(&snapshot.client_country));
    println!("Date:      {}", show(&snapshot.date));
    println!("PI No.:    {}", show(&snapshot.document_number));
    println!();

    let rows: Vec<ItemRow> = draft
        .items
        .iter()
        .map(|item| ItemRow {
            id: item.id.clone(),
            code: item.item_code.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: money(symbol, item.unit_price),
            total: money(symbol, item.total),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Grand total:      {}", money(symbol, snapshot.grand_total));
    println!(
        "Tax ({}%):         {}",
        render::plain_number(snapshot.tax_percent),
        money(symbol, snapshot.tax_amount)
    );
    println!(
        "Discount ({}%):    {}",
        render::plain_number(snapshot.discount_percent),
        money(symbol, snapshot.discount_amount)
    );
    println!("Net total:        {}", money(symbol, snapshot.net_total));

    if draft.subtype.carries_payment_terms() {
        let terms = &draft.payment_terms;
        println!();
        println!("Payment terms:        {}", show(&terms.payment_terms));
        println!("Price validity:       {}", show(&terms.price_validity));
        println!("Port of loading:      {}", show(&terms.port_of_loading));
        println!("Port of destination:  {}", show(&terms.port_of_destination));
        println!("Time of shipment:     {}", show(&terms.time_of_shipment));
        println!("Bank name:            {}", show(&terms.bank_name));
        println!("Account no.:          {}", show(&terms.account_no));
        println!("Remarks:              {}", show(&terms.remarks));
    }
}

/// Render the draft of `subtype` to a PDF
fn cmd_generate(
    cfg_dir: &Path,
    subtype: Subtype,
    raster: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    require_initialized(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let output_dir =
        output_dir.unwrap_or_else(|| resolve_output_dir(&config.pdf.output_dir, cfg_dir));

    let editor = open_editor(cfg_dir, subtype);
    let snapshot = InvoiceSnapshot::from_draft(editor.draft());
    let path = if raster {
        RenderPath::Raster
    } else {
        RenderPath::Vector
    };

    let mut job = DocumentJob::new(&snapshot, &config.company, &config.assets, output_dir, path);
    let written = job.run()?;
    println!("Generated: {}", written.display());
    Ok(())
}

/// Render a shipment tracking report
fn cmd_shipment_report(
    cfg_dir: &Path,
    source: ShipmentSource,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    require_initialized(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let now = Local::now();
    let today = now.date_naive();

    let report = match source.input.filter(|_| !source.sample) {
        Some(path) => ShipmentReport::load(&path)?,
        None => ShipmentReport::sample(today),
    };

    let assets = Assets::load(&config.assets);
    let generated_at = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let bytes = render::render_shipment(&report, &config.company, &assets, &generated_at)?;

    let output_dir =
        output_dir.unwrap_or_else(|| resolve_output_dir(&config.pdf.output_dir, cfg_dir));
    let written = render::write_document(&output_dir, &report.filename(today), &bytes)?;
    println!("Generated: {}", written.display());
    Ok(())
}
