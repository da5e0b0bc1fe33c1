use libdosboot::callback::CallbackTable;
use libdosboot::code_page::code_page_for;
use libdosboot::cross;
use libdosboot::dos_memory::DosPrivateAllocator;
use libdosboot::dos_tables::{setup_tables, DosTablesConfig, MachineType};
use libdosboot::error::Error;
use libdosboot::host_directory::{DirectoryHandle, ShortNameMode};
use libdosboot::memory::GuestMemory;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "dosboot", about = "DOS kernel table layout and host directory listing")]
struct Cli {
	/// Show debug output (RUST_LOG overrides).
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// List a host directory the way DOS will see it.
	Dir {
		path: PathBuf,
		#[arg(long)]
		codepage: Option<u16>,
		/// Only report short names the host provides.
		#[arg(long)]
		host_short_names: bool,
	},
	/// Build the DOS tables and print where they were placed.
	Tables {
		#[arg(long, default_value = "ibm")]
		machine: MachineType,
		#[arg(long)]
		codepage: Option<u16>,
		/// Install the double byte lead table on a non-Japanese machine.
		#[arg(long)]
		set_ax: bool,
	},
	/// Print the location of the configuration file.
	ConfigLocation,
}

fn list_directory(path: &Path, codepage: Option<u16>, host_short_names: bool) -> anyhow::Result<()> {
	let mode = if host_short_names { ShortNameMode::HostOnly } else { ShortNameMode::Synthesize };
	let handle = DirectoryHandle::open(path)
		.with_context(|| format!("Couldn't open {}", path.display()))?
		.with_code_page(code_page_for(codepage.unwrap_or(437)))
		.with_short_name_mode(mode);
	let mut count = 0;
	for entry in handle {
		let kind = if entry.is_directory { "<DIR>" } else { "" };
		println!("{:<12} {:<5} {}", entry.short_name, kind, entry.long_name);
		count += 1;
	}
	info!("{} entries", count);
	Ok(())
}

fn print_tables(machine: MachineType, codepage: Option<u16>, set_ax: bool) -> anyhow::Result<()> {
	let mut config = DosTablesConfig::for_machine(machine);
	config.set_ax_enabled = set_ax;
	if let Some(codepage) = codepage {
		config.code_page = codepage;
	}

	let mut memory = GuestMemory::new();
	let mut allocator = DosPrivateAllocator::new();
	let mut callbacks = CallbackTable::new();
	let tables = match setup_tables(&mut memory, &mut allocator, &mut callbacks, &config) {
		Ok(tables) => tables,
		Err(err @ Error::OutOfTableMemory { .. }) => {
			// Nothing can boot without the tables.
			eprintln!("{}", err);
			std::process::exit(1);
		}
		Err(err) => return Err(err.into()),
	};

	println!("list of lists    {}", tables.info_block.list_of_lists());
	println!("media id         {}", tables.mediaid);
	println!("temp DTA         {}", tables.tempdta);
	println!("FCB delete DTA   {}", tables.tempdta_fcbdelete);
	println!("DBCS table       {}", tables.dbcs);
	println!("file name chars  {}", tables.filenamechar);
	println!("collating seq    {}", tables.collatingseq);
	println!("upper case       {}", tables.upcase);
	println!("FCB SFT          {}", tables.fcb_sft);
	println!("DPB              {:04x}:0000", tables.dpb);
	println!("device packet    {:04x}:0000", tables.dcp);
	println!("disk buffer      {}", tables.disk_buffer_head);
	println!("country info     {:04x}:0000", tables.country_seg);
	println!("case map         {}", tables.casemap);
	println!("LFN DTA          {:04x}:0000", tables.lfn_dta_seg);
	if let Some(seg) = tables.con_driver_seg {
		println!("$IBMADSP         {:04x}:0000", seg);
	}
	if let Some(seg) = tables.win_startup_info_seg {
		println!("Win startup info {:04x}:0000", seg);
	}
	info!("{} paragraphs of private memory left", allocator.remaining_pages());
	Ok(())
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
	env_logger::Builder::new()
		.filter_module("libdosboot", level)
		.filter_module("dosboot", level)
		.parse_default_env()
		.target(env_logger::Target::Stderr)
		.format_timestamp(None)
		.init();

	match cli.command {
		Command::Dir { path, codepage, host_short_names } => list_directory(&path, codepage, host_short_names),
		Command::Tables { machine, codepage, set_ax } => print_tables(machine, codepage, set_ax),
		Command::ConfigLocation => {
			println!("{}", cross::config_file_path());
			Ok(())
		}
	}
}
