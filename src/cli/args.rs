use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cart")]
#[command(about = "Manage a session-backed shopping cart from the terminal")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Session file to read and write (defaults to CART_SESSION_FILE)
    #[arg(short, long, global = true)]
    pub session: Option<String>,

    /// Key the cart is stored under inside the session (defaults to CART_SESSION_KEY)
    #[arg(short, long, global = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a line item
    Add {
        /// Item name
        name: String,
        /// Unit price
        #[arg(short, long)]
        price: f64,
        /// Quantity
        #[arg(short, long, default_value_t = 1.0)]
        qty: f64,
        /// Explicit row id (generated when omitted)
        #[arg(long)]
        row_id: Option<String>,
        /// Item discount, fixed ("2") or percentage ("10%")
        #[arg(long)]
        discount: Option<String>,
        /// Item tax, fixed ("2") or percentage ("10%")
        #[arg(long)]
        tax: Option<String>,
        /// Option as NAME=VALUE, repeatable
        #[arg(short, long = "option")]
        options: Vec<String>,
    },
    /// Update an existing line item
    Update {
        /// Row id of the item
        row_id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New unit price
        #[arg(short, long)]
        price: Option<f64>,
        /// New quantity
        #[arg(short, long)]
        qty: Option<f64>,
        /// New item discount
        #[arg(long)]
        discount: Option<String>,
        /// New item tax
        #[arg(long)]
        tax: Option<String>,
        /// Option as NAME=VALUE, repeatable
        #[arg(short, long = "option")]
        options: Vec<String>,
    },
    /// Remove one or more line items
    Remove {
        /// Row ids to remove
        #[arg(required = true)]
        row_ids: Vec<String>,
    },
    /// List the items in the cart
    List,
    /// Show one line item in detail
    Show {
        /// Row id of the item
        row_id: String,
    },
    /// Show cart totals
    Total {
        /// Cart-level discount, fixed ("5") or percentage ("10%")
        #[arg(long)]
        discount: Option<String>,
        /// Cart-level tax, fixed ("2") or percentage ("10%")
        #[arg(long)]
        tax: Option<String>,
    },
    /// Print the stored cart as JSON
    Export {
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Remove the cart from the session
    Destroy {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}
